//! Fast tier: live request counts with per-id expiry.
//!
//! Each id owns one entry holding the cached quota metadata and the count for
//! the current window. Windows are fixed and anchored at the first increment
//! after the previous window expired.

pub mod error;
pub mod memory;

use std::time::Duration;

pub use error::CounterError;
pub use memory::MemoryCounterStore;

/// Quota metadata cached next to the live count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedQuota {
    pub limit: u64,
    pub window: Duration,
}

/// Outcome of [`CounterStore::increment_and_check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Increment {
    /// Requests admitted in the current window, including this one when admitted.
    pub count: u64,
    pub admitted: bool,
    pub resets_in: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub id: String,
    pub count: u64,
    pub denied: u64,
    pub resets_in: Duration,
}

pub trait CounterStore: Send + Sync {
    /// Cache quota metadata unless live metadata already exists. Never touches
    /// the count. Returns `true` when metadata was written.
    fn init_if_absent(&self, id: &str, limit: u64, window: Duration) -> Result<bool, CounterError>;

    /// Overwrite cached metadata and restart its TTL, keeping the live count.
    fn put_config(&self, id: &str, limit: u64, window: Duration) -> Result<(), CounterError>;

    fn get_config(&self, id: &str) -> Result<Option<CachedQuota>, CounterError>;

    /// Indivisibly test and increment the count for `id`. A request is admitted
    /// while the window count is below `limit`; denied requests leave the count
    /// unchanged. The first increment of a window sets its expiry to `window`.
    fn increment_and_check(
        &self,
        id: &str,
        limit: u64,
        window: Duration,
    ) -> Result<Increment, CounterError>;

    /// Remove metadata and count together. Returns `true` if anything was removed.
    fn delete(&self, id: &str) -> Result<bool, CounterError>;

    /// Live window for `id`, if one is running.
    fn snapshot(&self, id: &str) -> Result<Option<CounterSnapshot>, CounterError>;

    fn snapshot_all(&self) -> Result<Vec<CounterSnapshot>, CounterError>;

    /// Drop entries whose metadata and window have both expired.
    fn purge_expired(&self) -> usize;
}
