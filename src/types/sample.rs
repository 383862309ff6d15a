use super::{AttributeValue, Item};

use serde::Serialize;

pub const ATTR_ID: &str = "id";
pub const ATTR_TIMESTAMP: &str = "timestamp";
pub const ATTR_SERIES: &str = "series";
pub const ATTR_VALUE: &str = "value";

/// One synthetic observation of a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub id: u64,
    /// Seconds since the unix epoch.
    pub timestamp: i64,
    pub series_label: String,
    pub value: f64,
}

impl Sample {
    pub fn key(&self) -> Item {
        Item::new().with(ATTR_ID, AttributeValue::number(self.id))
    }

    pub fn id_of(item: &Item) -> Option<u64> {
        item.number(ATTR_ID).and_then(|n| n.parse().ok())
    }
}

impl From<&Sample> for Item {
    fn from(sample: &Sample) -> Item {
        // f64's Display is the shortest representation that parses back exactly.
        Item::new()
            .with(ATTR_ID, AttributeValue::number(sample.id))
            .with(ATTR_TIMESTAMP, AttributeValue::number(sample.timestamp))
            .with(ATTR_SERIES, AttributeValue::string(sample.series_label.as_str()))
            .with(ATTR_VALUE, AttributeValue::number(sample.value))
    }
}

impl TryFrom<&Item> for Sample {
    type Error = String;

    fn try_from(item: &Item) -> Result<Sample, String> {
        fn parse<T: std::str::FromStr>(item: &Item, key: &str) -> Result<T, String> {
            item.number(key)
                .ok_or_else(|| format!("missing numeric attribute `{key}`"))?
                .parse()
                .map_err(|_| format!("attribute `{key}` is not a valid number"))
        }

        Ok(Sample {
            id: parse(item, ATTR_ID)?,
            timestamp: parse(item, ATTR_TIMESTAMP)?,
            series_label: item
                .string(ATTR_SERIES)
                .ok_or_else(|| format!("missing string attribute `{ATTR_SERIES}`"))?
                .to_string(),
            value: parse(item, ATTR_VALUE)?,
        })
    }
}
