use crate::retry::Backoff;
use crate::series::SeriesSpec;

use serde::Deserialize;
use std::fs;
use std::path::Path;
use validator::{Validate, ValidationError};

/// Optional settings read from a YAML file. Anything left out falls back to
/// the built-in defaults.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub endpoint_url: Option<String>,
    pub region: Option<String>,
    pub local_credentials: Option<bool>,
    #[validate(custom = "validate_table_name")]
    pub table: Option<String>,
    #[validate(custom = "validate_table_name")]
    pub ts_table: Option<String>,
    #[validate(range(min = 1))]
    pub steps: Option<u64>,
    #[validate(range(min = 1, max = 25))]
    pub batch_size: Option<usize>,
    #[validate(range(min = 1, max = 16))]
    pub concurrency: Option<usize>,
    pub retry: Option<Backoff>,
    #[validate(range(min = 1))]
    pub table_wait_secs: Option<u64>,
    #[validate(length(min = 1))]
    pub series: Option<Vec<SeriesSpec>>,
}

impl ConfigFile {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<ConfigFile, String> {
        let content = fs::read_to_string(&path).map_err(|err| {
            format!("Failed to read: {}. {err}", path.as_ref().to_string_lossy())
        })?;
        serde_yaml::from_str(&content)
            .map_err(|err| format!("Failed to deserialize config file: {err}"))
    }
}

/// DynamoDB table names are 3 to 255 characters of `[A-Za-z0-9_.-]`.
pub fn validate_table_name(name: &str) -> Result<(), ValidationError> {
    if !(3..=255).contains(&name.len()) {
        let mut err = ValidationError::new("table_name_length");
        err.message = Some("must be between 3 and 255 characters".into());
        return Err(err);
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        let mut err = ValidationError::new("table_name_chars");
        err.message = Some("may only contain letters, digits, `_`, `-` and `.`".into());
        return Err(err);
    }

    Ok(())
}
