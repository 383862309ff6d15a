use aws_sdk_dynamodb::types;
use serde::Serialize;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TableStatus {
    Active,
    Creating,
    Deleting,
    Updating,
    Unknown,
}

impl From<types::TableStatus> for TableStatus {
    fn from(status: types::TableStatus) -> TableStatus {
        match status {
            types::TableStatus::Active => TableStatus::Active,
            types::TableStatus::Creating => TableStatus::Creating,
            types::TableStatus::Deleting => TableStatus::Deleting,
            types::TableStatus::Updating => TableStatus::Updating,
            _ => TableStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    S,
    N,
    B,
}

impl From<ScalarType> for types::ScalarAttributeType {
    fn from(value: ScalarType) -> types::ScalarAttributeType {
        match value {
            ScalarType::S => types::ScalarAttributeType::S,
            ScalarType::N => types::ScalarAttributeType::N,
            ScalarType::B => types::ScalarAttributeType::B,
        }
    }
}

/// Single-attribute hash key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    pub attribute: String,
    pub scalar_type: ScalarType,
}

impl KeySchema {
    pub fn numeric_hash<T: Into<String>>(attribute: T) -> Self {
        Self {
            attribute: attribute.into(),
            scalar_type: ScalarType::N,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BillingMode {
    #[default]
    OnDemand,
    Provisioned {
        read_capacity: i64,
        write_capacity: i64,
    },
}

impl From<BillingMode> for types::BillingMode {
    fn from(value: BillingMode) -> types::BillingMode {
        match value {
            BillingMode::OnDemand => types::BillingMode::PayPerRequest,
            BillingMode::Provisioned { .. } => types::BillingMode::Provisioned,
        }
    }
}
