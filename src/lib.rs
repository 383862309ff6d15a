pub mod cli;
pub mod client;
pub mod config;
mod error;
pub mod fixture;
pub mod loader;
pub mod provision;
pub mod retry;
pub mod series;
pub mod types;

pub use error::{Error, Result};

pub const ENV_DYNAMODB_ENDPOINT_URL: &str = "DYNAMODB_ENDPOINT_URL";
pub const ENV_CONFIG_PATH: &str = "DYNAMO_SEED_CONFIG";
