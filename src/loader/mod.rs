mod report;

use crate::client::{Client, StoreError};
use crate::error::{Error, Result};
use crate::retry::Backoff;
use crate::series::{self, SeriesSpec, TimeSeries};
use crate::types::{Item, Sample};

pub use report::{AbandonReason, AbandonedItem, LoadError, LoadReport, LoadStatus};

use futures::stream::{self, StreamExt};
use rand::rngs::StdRng;
use std::sync::Arc;
use tokio::time::{sleep_until, timeout_at, Instant};
use tracing::{debug, info, warn};

/// Upper bound of items in a single batch write request.
pub const MAX_BATCH_SIZE: usize = 25;

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub batch_size: usize,
    /// Batch write requests in flight at once.
    pub concurrency: usize,
    pub retry: Backoff,
    /// Batches still unconfirmed at this point are given up.
    ///
    /// A request cut short by the deadline may already have been applied by
    /// the store; its items are reported as abandoned all the same.
    pub deadline: Option<Instant>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            concurrency: 4,
            retry: Backoff::default(),
            deadline: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Generating,
    Loading,
    Complete,
    PartiallyFailed,
}

pub struct TimeSeriesLoader {
    client: Arc<dyn Client>,
    options: LoadOptions,
    state: LoadState,
}

impl TimeSeriesLoader {
    pub fn new(client: Arc<dyn Client>, options: LoadOptions) -> Self {
        Self {
            client,
            options,
            state: LoadState::Idle,
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Starts a new run with a fresh sample sequence.
    pub fn generate(&mut self, steps: u64, series: Vec<SeriesSpec>) -> TimeSeries<StdRng> {
        self.state = LoadState::Generating;
        series::generate(steps, series)
    }

    /// Writes all samples to `table` in batches.
    ///
    /// Items the store keeps refusing are reported as abandoned rather than
    /// failing the whole load. Fails with [`Error::Connection`] only when
    /// no request reached the store at all.
    pub async fn load<I>(&mut self, table: &str, samples: I) -> Result<LoadReport>
    where
        I: IntoIterator<Item = Sample>,
    {
        self.state = LoadState::Loading;

        let result = self.write_all(table, samples.into_iter()).await;

        self.state = match &result {
            Ok(report) if report.is_complete() => LoadState::Complete,
            _ => LoadState::PartiallyFailed,
        };

        result
    }

    async fn write_all<I>(&self, table: &str, samples: I) -> Result<LoadReport>
    where
        I: Iterator<Item = Sample>,
    {
        let LoadOptions {
            batch_size,
            concurrency,
            retry,
            deadline,
        } = self.options;
        let batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        let concurrency = concurrency.max(1);

        info!("Loading into `{table}` ({batch_size} items per batch, {concurrency} in flight)");

        let client = Arc::clone(&self.client);
        let outcomes = stream::iter(batches(samples, batch_size))
            .map(|batch| {
                let client = Arc::clone(&client);
                async move { write_batch(client.as_ref(), table, batch, retry, deadline).await }
            })
            .buffer_unordered(concurrency);
        futures::pin_mut!(outcomes);

        let mut report = LoadReport::new(table);
        let mut reached_store = false;
        let mut connection_error: Option<StoreError> = None;

        while let Some(outcome) = outcomes.next().await {
            report.batches += 1;
            report.requested += outcome.requested;
            report.confirmed += outcome.confirmed;
            report.abandoned.extend(outcome.abandoned);

            reached_store |= outcome.reached_store;
            if outcome.connection_error.is_some() {
                connection_error = outcome.connection_error;
            }
        }

        if !reached_store {
            if let Some(err) = connection_error {
                return Err(Error::Connection(err));
            }
        }

        let report = report.finish();
        info!(
            "Loaded {}/{} items into `{table}` in {} batches",
            report.confirmed, report.requested, report.batches
        );
        if !report.abandoned.is_empty() {
            warn!("{} items abandoned", report.abandoned.len());
        }

        Ok(report)
    }
}

/// Splits the samples into batches lazily.
fn batches<I>(mut samples: I, size: usize) -> impl Iterator<Item = Vec<Sample>>
where
    I: Iterator<Item = Sample>,
{
    std::iter::from_fn(move || {
        let batch: Vec<Sample> = samples.by_ref().take(size).collect();
        (!batch.is_empty()).then_some(batch)
    })
}

#[derive(Debug, Default)]
struct BatchOutcome {
    requested: usize,
    confirmed: usize,
    abandoned: Vec<AbandonedItem>,
    reached_store: bool,
    connection_error: Option<StoreError>,
}

impl BatchOutcome {
    fn abandon(&mut self, items: Vec<Item>, reason: AbandonReason) {
        self.abandoned.extend(
            items
                .iter()
                .filter_map(Sample::id_of)
                .map(|id| AbandonedItem {
                    id,
                    reason: reason.clone(),
                }),
        );
    }
}

/// Writes one batch, resubmitting only the unprocessed items until none are
/// left, the retry budget is spent or the deadline passes.
async fn write_batch(
    client: &dyn Client,
    table: &str,
    batch: Vec<Sample>,
    retry: Backoff,
    deadline: Option<Instant>,
) -> BatchOutcome {
    let mut pending: Vec<Item> = batch.iter().map(Item::from).collect();
    let mut outcome = BatchOutcome {
        requested: pending.len(),
        ..BatchOutcome::default()
    };
    let mut attempt: u32 = 0;

    loop {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            outcome.abandon(pending, AbandonReason::DeadlineExceeded);
            break;
        }

        let request = client.batch_write(table, pending.clone());
        let result = match deadline {
            Some(d) => match timeout_at(d, request).await {
                Ok(result) => result,
                Err(_) => {
                    outcome.abandon(pending, AbandonReason::DeadlineExceeded);
                    break;
                }
            },
            None => request.await,
        };

        match result {
            Ok(unprocessed) if unprocessed.len() > pending.len() => {
                let message = format!(
                    "store reported {} unprocessed items for a batch of {}",
                    unprocessed.len(),
                    pending.len()
                );
                warn!("Batch write answer ignored: {message}");
                outcome.reached_store = true;
                outcome.abandon(pending, AbandonReason::Rejected(message));
                break;
            }
            Ok(unprocessed) => {
                outcome.reached_store = true;
                outcome.confirmed += pending.len() - unprocessed.len();
                pending = unprocessed;
            }
            Err(err) if err.is_retryable() => {
                warn!("Batch write of {} items failed: {err}", pending.len());
                if err.is_unreachable() {
                    outcome.connection_error = Some(err);
                } else {
                    outcome.reached_store = true;
                }
            }
            Err(err) => {
                warn!("Batch write of {} items rejected: {err}", pending.len());
                outcome.reached_store = true;
                outcome.abandon(pending, AbandonReason::Rejected(err.to_string()));
                break;
            }
        }

        if pending.is_empty() {
            break;
        }

        if attempt >= retry.max_retries {
            outcome.abandon(pending, AbandonReason::RetriesExhausted);
            break;
        }

        let wake = Instant::now() + retry.delay(attempt);
        debug!("Resubmitting {} items (retry {})", pending.len(), attempt + 1);
        sleep_until(deadline.map_or(wake, |d| wake.min(d))).await;
        attempt += 1;
    }

    outcome
}
