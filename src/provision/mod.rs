use crate::client::{Client, StoreError};
use crate::retry::Backoff;
use crate::types::{BillingMode, KeySchema, TableStatus, ATTR_ID};

use std::sync::Arc;
use thiserror::Error;
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("failed to provision table `{table}`: {source}")]
    Store {
        table: String,
        #[source]
        source: StoreError,
    },
    #[error("table `{table}` did not become {expected} within {waited:?}")]
    NotReady {
        table: String,
        expected: &'static str,
        waited: Duration,
    },
}

impl ProvisionError {
    fn store(table: &str, source: StoreError) -> Self {
        Self::Store {
            table: table.into(),
            source,
        }
    }
}

/// How long and how often to poll while a table changes state.
#[derive(Debug, Clone, Copy)]
pub struct TableWait {
    pub max_wait: Duration,
    pub poll: Backoff,
}

impl Default for TableWait {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(60),
            poll: Backoff {
                base_delay_ms: 100,
                max_delay_ms: 2_000,
                max_retries: u32::MAX,
            },
        }
    }
}

/// Recreates tables from scratch.
pub struct TableProvisioner {
    client: Arc<dyn Client>,
    key: KeySchema,
    billing: BillingMode,
    retry: Backoff,
    wait: TableWait,
}

impl TableProvisioner {
    pub fn new(client: Arc<dyn Client>) -> Self {
        Self {
            client,
            key: KeySchema::numeric_hash(ATTR_ID),
            billing: BillingMode::OnDemand,
            retry: Backoff::default(),
            wait: TableWait::default(),
        }
    }

    pub fn set_retry(self, retry: Backoff) -> Self {
        Self { retry, ..self }
    }

    pub fn set_wait(self, wait: TableWait) -> Self {
        Self { wait, ..self }
    }

    pub fn set_billing(self, billing: BillingMode) -> Self {
        Self { billing, ..self }
    }

    /// Drops `table` if it exists and creates it again, empty, keyed by a
    /// numeric `id`.
    ///
    /// This is destructive: every item in an existing table of that name is
    /// lost for good. Returns once the new table accepts writes.
    pub async fn reset(&self, table: &str) -> Result<(), ProvisionError> {
        self.drop_table(table).await?;
        self.create_table(table).await?;
        info!("Table `{table}` is ready");
        Ok(())
    }

    async fn drop_table(&self, table: &str) -> Result<(), ProvisionError> {
        let client = &self.client;
        let tables = self
            .retry
            .retry("ListTables", || client.list_tables())
            .await
            .map_err(|err| ProvisionError::store(table, err))?;

        if !tables.iter().any(|name| name == table) {
            debug!("Table `{table}` does not exist yet");
            return Ok(());
        }

        info!("Deleting table `{table}`");
        match self
            .retry
            .retry("DeleteTable", || client.delete_table(table))
            .await
        {
            // Someone else removed it between listing and deleting.
            Ok(()) | Err(StoreError::NotFound(_)) => {}
            Err(err) => return Err(ProvisionError::store(table, err)),
        }

        self.await_status(table, None).await
    }

    async fn create_table(&self, table: &str) -> Result<(), ProvisionError> {
        let client = &self.client;
        info!("Creating table `{table}`");

        self.retry
            .retry("CreateTable", || {
                client.create_table(table, &self.key, self.billing)
            })
            .await
            .map_err(|err| ProvisionError::store(table, err))?;

        self.await_status(table, Some(TableStatus::Active)).await
    }

    /// Polls until the table reports `expected`; `None` means "gone".
    async fn await_status(
        &self,
        table: &str,
        expected: Option<TableStatus>,
    ) -> Result<(), ProvisionError> {
        let started = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            let status = self
                .retry
                .retry("DescribeTable", || self.client.describe_table(table))
                .await
                .map_err(|err| ProvisionError::store(table, err))?;

            if status == expected {
                return Ok(());
            }

            let waited = started.elapsed();
            if waited >= self.wait.max_wait {
                return Err(ProvisionError::NotReady {
                    table: table.into(),
                    expected: if expected.is_some() { "active" } else { "deleted" },
                    waited,
                });
            }

            debug!("Table `{table}` is {status:?}, waiting");
            sleep(self.wait.poll.delay(attempt)).await;
            attempt = attempt.saturating_add(1);
        }
    }
}
