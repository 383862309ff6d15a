use crate::client::StoreError;
use crate::config::ConfigError;
use crate::loader::LoadError;
use crate::provision::ProvisionError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error(transparent)]
    Provision(#[from] ProvisionError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("store unreachable: {0}")]
    Connection(#[source] StoreError),
    #[error("{mismatches} of {checked} samples read back differently than written")]
    Verify { mismatches: usize, checked: usize },
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Configuration(_) => 1,
            Error::Provision(_) => 2,
            Error::Connection(_) => 3,
            Error::Load(_) => 4,
            Error::Verify { .. } => 5,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
