use crate::client::{Client, DynamodbClient, StoreError};
use crate::config::{Config, ConfigError};
use crate::error::{Error, Result};
use crate::fixture;
use crate::loader::{AbandonReason, AbandonedItem, LoadError, LoadReport, TimeSeriesLoader};
use crate::provision::TableProvisioner;
use crate::types::Sample;

use clap::{error::ErrorKind, ArgAction, Parser, ValueEnum};
use std::ffi::OsString;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::{Duration, Instant};
use tracing::{error, info, warn};

const FIXTURE_ID: u64 = 1;
const VERIFY_SAMPLES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Recreate the table and write one item holding every attribute type
    Table,
    /// Recreate the table and load a synthetic time series
    Ts,
}

#[derive(Debug, Parser)]
#[command(
    name = "dynamo-seed",
    version,
    about = "Seed a local DynamoDB endpoint with fixture data"
)]
pub struct Args {
    #[arg(value_enum)]
    pub mode: Mode,

    /// Table to recreate (defaults to `test` or `ts` depending on the mode)
    #[arg(short, long)]
    pub table: Option<String>,

    /// Time steps to generate; each step yields one sample per series
    #[arg(short = 'n', long)]
    pub count: Option<u64>,

    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// YAML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Give up on unconfirmed batches after this many seconds
    #[arg(long)]
    pub deadline_secs: Option<u64>,

    /// Read a few samples back after loading and compare them
    #[arg(long)]
    pub verify: bool,

    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

pub fn exit_code(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

/// Parses `argv`, then seeds the store returned by `connect`.
///
/// Returns the process exit code. Nothing connects to the store unless the
/// arguments and settings are valid.
pub async fn main_with<I, T, S, F, Fut>(argv: I, init: S, connect: F) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    S: FnOnce(&Args),
    F: FnOnce(&Config) -> Fut,
    Fut: Future<Output = Arc<dyn Client>>,
{
    let args = match Args::try_parse_from(argv) {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return exit_code(&err);
        }
    };

    init(&args);

    match execute(&args, connect).await {
        Ok(()) => 0,
        Err(err) => {
            error!("{err}");
            err.exit_code()
        }
    }
}

pub fn connect_dynamodb(config: &Config) -> impl Future<Output = Arc<dyn Client>> {
    let url = config.endpoint_url();
    let local = config.local_credentials();
    let region = config.region().to_string();

    async move {
        let client = DynamodbClient::builder()
            .await
            .endpoint_url(url)
            .local_credentials(local, &region)
            .build();
        Arc::new(client) as Arc<dyn Client>
    }
}

pub fn configure(args: &Args) -> std::result::Result<Config, ConfigError> {
    let mut config = Config::load(args.config.clone())?.set_endpoint_url(args.endpoint_url.clone());

    if let Some(name) = args.table.clone() {
        config = match args.mode {
            Mode::Table => config.set_table(name)?,
            Mode::Ts => config.set_ts_table(name)?,
        };
    }

    if let Some(count) = args.count {
        config = config.set_steps(count)?;
    }

    Ok(config)
}

async fn execute<F, Fut>(args: &Args, connect: F) -> Result<()>
where
    F: FnOnce(&Config) -> Fut,
    Fut: Future<Output = Arc<dyn Client>>,
{
    let config = configure(args)?;
    let client = connect(&config).await;

    match args.mode {
        Mode::Table => seed_table(&config, client).await,
        Mode::Ts => {
            let deadline = args
                .deadline_secs
                .map(|secs| Instant::now() + Duration::from_secs(secs));
            seed_time_series(&config, client, deadline, args.verify)
                .await?
                .check()?;
            Ok(())
        }
    }
}

fn provisioner(config: &Config, client: &Arc<dyn Client>) -> TableProvisioner {
    TableProvisioner::new(Arc::clone(client))
        .set_retry(config.load_options().retry)
        .set_wait(config.table_wait())
}

/// Resets the table and writes the all-types fixture item.
pub async fn seed_table(config: &Config, client: Arc<dyn Client>) -> Result<()> {
    let table = config.table();
    provisioner(config, &client).reset(table).await?;

    let item = fixture::all_types_item(FIXTURE_ID);
    config
        .load_options()
        .retry
        .retry("PutItem", || client.put_item(table, item.clone()))
        .await
        .map_err(|err| match err {
            StoreError::Unreachable(_) => Error::Connection(err),
            err => Error::Load(LoadError {
                requested: 1,
                abandoned: vec![AbandonedItem {
                    id: FIXTURE_ID,
                    reason: AbandonReason::Rejected(err.to_string()),
                }],
            }),
        })?;

    info!("Wrote fixture item {FIXTURE_ID} to `{table}`");
    Ok(())
}

/// Resets the time-series table, then generates and loads the samples.
pub async fn seed_time_series(
    config: &Config,
    client: Arc<dyn Client>,
    deadline: Option<Instant>,
    verify: bool,
) -> Result<LoadReport> {
    let table = config.ts_table();
    provisioner(config, &client).reset(table).await?;

    let mut options = config.load_options();
    options.deadline = deadline;

    let mut loader = TimeSeriesLoader::new(Arc::clone(&client), options);
    let samples = loader.generate(config.steps(), config.series());

    if !verify {
        let report = loader.load(table, samples).await?;
        print_report(&report);
        return Ok(report);
    }

    let samples: Vec<Sample> = samples.collect();
    let report = loader.load(table, samples.clone()).await?;
    print_report(&report);

    let (checked, mismatches) = verify_samples(client.as_ref(), table, &samples, &report).await;
    if mismatches > 0 && report.is_complete() {
        return Err(Error::Verify {
            mismatches,
            checked,
        });
    }

    Ok(report)
}

fn print_report(report: &LoadReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{json}"),
        Err(err) => warn!("Failed to render load report: {err}"),
    }
}

/// Reads back evenly spaced samples that were confirmed. Returns how many
/// were checked and how many differ from what was generated.
async fn verify_samples(
    client: &dyn Client,
    table: &str,
    samples: &[Sample],
    report: &LoadReport,
) -> (usize, usize) {
    let abandoned = report.abandoned_ids();
    let written: Vec<&Sample> = samples
        .iter()
        .filter(|s| !abandoned.contains(&s.id))
        .collect();

    let step = (written.len() / VERIFY_SAMPLES).max(1);
    let mut checked = 0;
    let mut mismatches = 0;

    for sample in written.into_iter().step_by(step).take(VERIFY_SAMPLES) {
        checked += 1;
        match client.get_item(table, sample.key()).await {
            Ok(Some(item)) if Sample::try_from(&item).as_ref() == Ok(sample) => {}
            Ok(found) => {
                warn!("Sample {} reads back as {:?}", sample.id, found);
                mismatches += 1;
            }
            Err(err) => {
                warn!("Failed to read sample {}: {err}", sample.id);
                mismatches += 1;
            }
        }
    }

    info!("Verified {checked} samples with {mismatches} mismatches");
    (checked, mismatches)
}
