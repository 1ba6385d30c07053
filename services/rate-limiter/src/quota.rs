use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::limiter::AdmissionError;

/// Largest accepted `limit`; the config store keeps it in a signed INTEGER column.
pub const MAX_LIMIT: u64 = i64::MAX as u64;

/// Largest accepted window, ten years in seconds.
pub const MAX_RESET_AFTER_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Quota for a single id: at most `limit` admissions per `reset_after` window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaConfig {
    pub id: String,
    pub limit: u64,
    /// Window length in whole seconds.
    pub reset_after: u64,
}

impl QuotaConfig {
    pub fn new(id: impl Into<String>, limit: u64, reset_after: u64) -> Result<Self, AdmissionError> {
        let config = Self {
            id: id.into(),
            limit,
            reset_after,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AdmissionError> {
        if self.id.trim().is_empty() {
            return Err(AdmissionError::InvalidInput("id cannot be empty".into()));
        }
        if self.limit == 0 {
            return Err(AdmissionError::InvalidInput(
                "limit must be greater than zero".into(),
            ));
        }
        if self.limit > MAX_LIMIT {
            return Err(AdmissionError::InvalidInput(format!(
                "limit must be at most {MAX_LIMIT}"
            )));
        }
        if self.reset_after == 0 {
            return Err(AdmissionError::InvalidInput(
                "reset_after must be greater than zero".into(),
            ));
        }
        if self.reset_after > MAX_RESET_AFTER_SECS {
            return Err(AdmissionError::InvalidInput(format!(
                "reset_after must be at most {MAX_RESET_AFTER_SECS} seconds"
            )));
        }
        Ok(())
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.reset_after)
    }
}
