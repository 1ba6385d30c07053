use thiserror::Error;

use crate::counter::CounterError;
use crate::storage::StorageError;

/// Failures of admission and configuration operations.
///
/// A denied request is not an error; see [`super::Decision::Denied`].
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("rate limiter {0} not found")]
    NotFound(String),
    #[error("config store error: {0}")]
    ConfigStore(#[from] StorageError),
    #[error("counter store error: {0}")]
    CounterStore(#[from] CounterError),
}

impl AdmissionError {
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::ConfigStore(_) | Self::CounterStore(_))
    }
}
