use super::{Client, Result, StoreError};
use crate::types::{BillingMode, Item, KeySchema, TableStatus};

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    config::{Builder as ConfigBuilder, Credentials, Region},
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    types::{
        AttributeDefinition, KeySchemaElement, KeyType, ProvisionedThroughput, PutRequest,
        WriteRequest,
    },
    Client as DbClient,
};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct DynamodbClient {
    client: DbClient,
}

impl DynamodbClient {
    pub async fn builder() -> DynamodbClientBuilder {
        DynamodbClientBuilder::new().await
    }
}

#[derive(Debug)]
pub struct DynamodbClientBuilder {
    builder: ConfigBuilder,
}

impl DynamodbClientBuilder {
    pub async fn new() -> Self {
        let config = aws_config::load_from_env().await;
        Self {
            builder: ConfigBuilder::from(&config),
        }
    }

    pub fn endpoint_url(self, url: Option<String>) -> Self {
        match url {
            Some(url) => Self {
                builder: self.builder.endpoint_url(url),
            },
            None => self,
        }
    }

    /// Static credentials and region for local emulators that accept anything.
    pub fn local_credentials(self, enabled: bool, region: &str) -> Self {
        if !enabled {
            return self;
        }

        let builder = self
            .builder
            .credentials_provider(Credentials::new("test", "test", None, None, "dynamo-seed"))
            .region(Region::new(region.to_string()));
        Self { builder }
    }

    pub fn build(self) -> DynamodbClient {
        DynamodbClient {
            client: DbClient::from_conf(self.builder.build()),
        }
    }
}

#[async_trait]
impl Client for DynamodbClient {
    async fn list_tables(&self) -> Result<Vec<String>> {
        let mut tables: Vec<String> = vec![];
        let mut last_table: Option<String> = None;

        loop {
            let output = self
                .client
                .list_tables()
                .set_exclusive_start_table_name(last_table.take())
                .send()
                .await
                .map_err(from_sdk_err)?;

            tables.append(&mut output.table_names.unwrap_or_default());

            match output.last_evaluated_table_name {
                Some(name) => last_table = Some(name),
                None => break,
            }
        }

        Ok(tables)
    }

    async fn describe_table(&self, table: &str) -> Result<Option<TableStatus>> {
        match self
            .client
            .describe_table()
            .table_name(table)
            .send()
            .await
            .map_err(from_sdk_err)
        {
            Ok(output) => Ok(Some(
                output
                    .table
                    .and_then(|t| t.table_status)
                    .map(TableStatus::from)
                    .unwrap_or(TableStatus::Unknown),
            )),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn delete_table(&self, table: &str) -> Result<()> {
        self.client
            .delete_table()
            .table_name(table)
            .send()
            .await
            .map(|_| ())
            .map_err(from_sdk_err)
    }

    async fn create_table(&self, table: &str, key: &KeySchema, billing: BillingMode) -> Result<()> {
        let throughput = match billing {
            BillingMode::OnDemand => None,
            BillingMode::Provisioned {
                read_capacity,
                write_capacity,
            } => Some(
                ProvisionedThroughput::builder()
                    .read_capacity_units(read_capacity)
                    .write_capacity_units(write_capacity)
                    .build()?,
            ),
        };

        self.client
            .create_table()
            .table_name(table)
            .attribute_definitions(
                AttributeDefinition::builder()
                    .attribute_name(key.attribute.as_str())
                    .attribute_type(key.scalar_type.into())
                    .build()?,
            )
            .key_schema(
                KeySchemaElement::builder()
                    .attribute_name(key.attribute.as_str())
                    .key_type(KeyType::Hash)
                    .build()?,
            )
            .billing_mode(billing.into())
            .set_provisioned_throughput(throughput)
            .send()
            .await
            .map(|_| ())
            .map_err(from_sdk_err)
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<()> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(item.into()))
            .send()
            .await
            .map(|_| ())
            .map_err(from_sdk_err)
    }

    async fn batch_write(&self, table: &str, items: Vec<Item>) -> Result<Vec<Item>> {
        let requests = items
            .into_iter()
            .map(|item| -> Result<WriteRequest> {
                let put = PutRequest::builder().set_item(Some(item.into())).build()?;
                Ok(WriteRequest::builder().put_request(put).build())
            })
            .collect::<Result<Vec<_>>>()?;

        let output = self
            .client
            .batch_write_item()
            .request_items(table, requests)
            .send()
            .await
            .map_err(from_sdk_err)?;

        let unprocessed: Vec<Item> = output
            .unprocessed_items
            .unwrap_or_default()
            .remove(table)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|request| request.put_request)
            .map(|put| Item::from(put.item))
            .collect();

        if !unprocessed.is_empty() {
            debug!("{} items left unprocessed in `{table}`", unprocessed.len());
        }

        Ok(unprocessed)
    }

    async fn get_item(&self, table: &str, key: Item) -> Result<Option<Item>> {
        self.client
            .get_item()
            .table_name(table)
            .set_key(Some(key.into()))
            .consistent_read(true)
            .send()
            .await
            .map(|output| output.item.map(Item::from))
            .map_err(from_sdk_err)
    }
}

fn from_sdk_err<E, R>(err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: fmt::Debug,
{
    let message = format!("{}", DisplayErrorContext(&err));

    match err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
            StoreError::Unreachable(message)
        }
        _ => match err.code() {
            Some("ResourceInUseException") => StoreError::ResourceInUse(message),
            Some("ResourceNotFoundException") => StoreError::NotFound(message),
            Some(
                "ProvisionedThroughputExceededException"
                | "ThrottlingException"
                | "RequestLimitExceeded",
            ) => StoreError::Throttled(message),
            _ => StoreError::Rejected(message),
        },
    }
}
