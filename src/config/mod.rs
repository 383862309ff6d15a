use crate::loader::LoadOptions;
use crate::provision::TableWait;
use crate::series::{default_series, SeriesSpec};
use crate::{ENV_CONFIG_PATH, ENV_DYNAMODB_ENDPOINT_URL};

use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use thiserror::Error;
use tokio::time::Duration;
use tracing::debug;
use validator::Validate;

mod file;

pub use file::{validate_table_name, ConfigFile};

pub const DEFAULT_ENDPOINT_URL: &str = "http://localhost:4566";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_TABLE: &str = "test";
pub const DEFAULT_TS_TABLE: &str = "ts";
pub const DEFAULT_STEPS: u64 = 1_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    File(String),
    #[error("invalid settings: {0}")]
    Invalid(#[from] validator::ValidationErrors),
    #[error("invalid table name `{name}`: {reason}")]
    TableName { name: String, reason: String },
    #[error("invalid series: {0}")]
    Series(String),
    #[error("count must be at least 1")]
    Count,
}

#[derive(Debug, Clone)]
pub struct Config {
    endpoint_url: Option<String>,
    region: String,
    local_credentials: bool,
    table: String,
    ts_table: String,
    steps: u64,
    series: Vec<SeriesSpec>,
    load: LoadOptions,
    table_wait: TableWait,
}

impl Config {
    /// Built-in defaults, overlaid with the config file (explicit `path`, or
    /// the one named by `DYNAMO_SEED_CONFIG`) and then the environment.
    pub fn load(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.or_else(|| env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from));

        let file = match path {
            Some(path) => {
                debug!("Reading config from {}", path.to_string_lossy());
                ConfigFile::read(path).map_err(ConfigError::File)?
            }
            None => ConfigFile::default(),
        };

        let mut config = Self::from_file(file)?;
        if let Ok(url) = env::var(ENV_DYNAMODB_ENDPOINT_URL) {
            config.endpoint_url = Some(url);
        }

        Ok(config)
    }

    pub fn from_file(file: ConfigFile) -> Result<Self, ConfigError> {
        file.validate()?;

        let series = file.series.unwrap_or_else(default_series);
        let mut labels = HashSet::new();
        if let Some(spec) = series.iter().find(|spec| !labels.insert(spec.label.as_str())) {
            return Err(ConfigError::Series(format!(
                "label `{}` is used more than once",
                spec.label
            )));
        }

        for spec in &series {
            spec.policy
                .check()
                .map_err(|reason| ConfigError::Series(format!("series `{}`: {reason}", spec.label)))?;
        }

        let defaults = LoadOptions::default();
        let load = LoadOptions {
            batch_size: file.batch_size.unwrap_or(defaults.batch_size),
            concurrency: file.concurrency.unwrap_or(defaults.concurrency),
            retry: file.retry.unwrap_or(defaults.retry),
            deadline: None,
        };

        let mut table_wait = TableWait::default();
        if let Some(secs) = file.table_wait_secs {
            table_wait.max_wait = Duration::from_secs(secs);
        }

        Ok(Self {
            endpoint_url: file
                .endpoint_url
                .or_else(|| Some(DEFAULT_ENDPOINT_URL.to_string())),
            region: file.region.unwrap_or_else(|| DEFAULT_REGION.to_string()),
            local_credentials: file.local_credentials.unwrap_or(true),
            table: file.table.unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            ts_table: file.ts_table.unwrap_or_else(|| DEFAULT_TS_TABLE.to_string()),
            steps: file.steps.unwrap_or(DEFAULT_STEPS),
            series,
            load,
            table_wait,
        })
    }

    pub fn set_endpoint_url(self, url: Option<String>) -> Self {
        Self {
            endpoint_url: url.or(self.endpoint_url),
            ..self
        }
    }

    pub fn set_table(self, name: String) -> Result<Self, ConfigError> {
        check_table_name(&name)?;
        Ok(Self { table: name, ..self })
    }

    pub fn set_ts_table(self, name: String) -> Result<Self, ConfigError> {
        check_table_name(&name)?;
        Ok(Self {
            ts_table: name,
            ..self
        })
    }

    pub fn set_steps(self, steps: u64) -> Result<Self, ConfigError> {
        if steps == 0 {
            return Err(ConfigError::Count);
        }
        Ok(Self { steps, ..self })
    }

    pub fn endpoint_url(&self) -> Option<String> {
        self.endpoint_url.clone()
    }

    pub fn region(&self) -> &str {
        self.region.as_str()
    }

    pub fn local_credentials(&self) -> bool {
        self.local_credentials
    }

    pub fn table(&self) -> &str {
        self.table.as_str()
    }

    pub fn ts_table(&self) -> &str {
        self.ts_table.as_str()
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn series(&self) -> Vec<SeriesSpec> {
        self.series.clone()
    }

    pub fn load_options(&self) -> LoadOptions {
        self.load
    }

    pub fn table_wait(&self) -> TableWait {
        self.table_wait
    }
}

fn check_table_name(name: &str) -> Result<(), ConfigError> {
    validate_table_name(name).map_err(|err| ConfigError::TableName {
        name: name.to_string(),
        reason: err
            .message
            .map(|m| m.to_string())
            .unwrap_or_else(|| err.code.to_string()),
    })
}
