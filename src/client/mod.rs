mod dynamodb;
#[cfg(test)]
mod mock;

use crate::types::{BillingMode, Item, KeySchema, TableStatus};

use async_trait::async_trait;
use thiserror::Error;

pub use dynamodb::{DynamodbClient, DynamodbClientBuilder};
#[cfg(test)]
pub use mock::{BatchFault, MockClient};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Unreachable(String),
    #[error("resource in use: {0}")]
    ResourceInUse(String),
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("request throttled: {0}")]
    Throttled(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("failed to build request: {0}")]
    Build(#[from] aws_sdk_dynamodb::error::BuildError),
}

impl StoreError {
    /// Errors worth sending the same request again for.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Unreachable(_) | StoreError::ResourceInUse(_) | StoreError::Throttled(_)
        )
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, StoreError::Unreachable(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// The operations the seeding jobs need from a DynamoDB-compatible store.
///
/// `create_table` returns as soon as the store accepted the request; the
/// table becomes writable once `describe_table` reports `ACTIVE`.
#[async_trait]
pub trait Client: Send + Sync {
    async fn list_tables(&self) -> Result<Vec<String>>;
    /// `None` if the table does not exist.
    async fn describe_table(&self, table: &str) -> Result<Option<TableStatus>>;
    async fn delete_table(&self, table: &str) -> Result<()>;
    async fn create_table(&self, table: &str, key: &KeySchema, billing: BillingMode) -> Result<()>;
    async fn put_item(&self, table: &str, item: Item) -> Result<()>;
    /// Writes all items in one request and returns those the store did not apply.
    async fn batch_write(&self, table: &str, items: Vec<Item>) -> Result<Vec<Item>>;
    async fn get_item(&self, table: &str, key: Item) -> Result<Option<Item>>;
}
