use std::time::Duration;

use serde::Serialize;

use crate::counter::CounterSnapshot;
use crate::quota::QuotaConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admitted {
        count: u64,
        limit: u64,
    },
    Denied {
        count: u64,
        limit: u64,
        retry_after: Duration,
    },
}

impl Decision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted { .. })
    }
}

/// Live usage of one configured id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageReport {
    pub id: String,
    pub limit: u64,
    pub reset_after: u64,
    pub current_requests: u64,
    pub denied_requests: u64,
    pub remaining: u64,
    pub resets_in_secs: Option<u64>,
}

impl UsageReport {
    pub fn new(config: &QuotaConfig, window: Option<&CounterSnapshot>) -> Self {
        let current_requests = window.map_or(0, |snapshot| snapshot.count);
        Self {
            id: config.id.clone(),
            limit: config.limit,
            reset_after: config.reset_after,
            current_requests,
            denied_requests: window.map_or(0, |snapshot| snapshot.denied),
            remaining: config.limit.saturating_sub(current_requests),
            resets_in_secs: window.map(|snapshot| ceil_secs(snapshot.resets_in)),
        }
    }
}

/// Whole seconds, rounded up, as used for `Retry-After`.
pub fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}
