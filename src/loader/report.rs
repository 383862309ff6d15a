use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "message")]
pub enum AbandonReason {
    /// Still unprocessed after the last retry.
    RetriesExhausted,
    /// The store refused the request outright.
    Rejected(String),
    /// Not confirmed before the deadline. The store may still hold the item
    /// if the last request was in flight when time ran out.
    DeadlineExceeded,
}

impl fmt::Display for AbandonReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbandonReason::RetriesExhausted => write!(f, "retries exhausted"),
            AbandonReason::Rejected(message) => write!(f, "rejected: {message}"),
            AbandonReason::DeadlineExceeded => {
                write!(f, "deadline exceeded before the write was confirmed")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbandonedItem {
    pub id: u64,
    pub reason: AbandonReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadStatus {
    Complete,
    PartiallyFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub table: String,
    pub requested: usize,
    pub confirmed: usize,
    pub batches: usize,
    pub abandoned: Vec<AbandonedItem>,
    pub status: LoadStatus,
}

impl LoadReport {
    pub fn new<T: Into<String>>(table: T) -> Self {
        Self {
            table: table.into(),
            requested: 0,
            confirmed: 0,
            batches: 0,
            abandoned: vec![],
            status: LoadStatus::Complete,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == LoadStatus::Complete
    }

    pub fn abandoned_ids(&self) -> Vec<u64> {
        self.abandoned.iter().map(|item| item.id).collect()
    }

    /// Turns a partially failed load into an error.
    pub fn check(self) -> Result<LoadReport, LoadError> {
        match self.status {
            LoadStatus::Complete => Ok(self),
            LoadStatus::PartiallyFailed => Err(LoadError {
                requested: self.requested,
                abandoned: self.abandoned,
            }),
        }
    }

    pub(super) fn finish(mut self) -> Self {
        self.abandoned.sort_by_key(|item| item.id);
        self.status = if self.abandoned.is_empty() && self.confirmed == self.requested {
            LoadStatus::Complete
        } else {
            LoadStatus::PartiallyFailed
        };
        self
    }
}

#[derive(Debug, Error)]
#[error("{} of {requested} items could not be written", .abandoned.len())]
pub struct LoadError {
    pub requested: usize,
    pub abandoned: Vec<AbandonedItem>,
}
