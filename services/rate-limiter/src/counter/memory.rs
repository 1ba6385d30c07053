use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use super::{CachedQuota, CounterError, CounterSnapshot, CounterStore, Increment};

#[derive(Debug, Clone, Copy)]
struct Metadata {
    limit: u64,
    window: Duration,
    expires_at: Instant,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u64,
    denied: u64,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct Slot {
    metadata: Option<Metadata>,
    window: Option<Window>,
}

impl Slot {
    fn live_metadata(&self, now: Instant) -> Option<&Metadata> {
        self.metadata.as_ref().filter(|meta| meta.expires_at > now)
    }

    fn live_window(&self, now: Instant) -> Option<&Window> {
        self.window.as_ref().filter(|window| window.expires_at > now)
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.live_metadata(now).is_none() && self.live_window(now).is_none()
    }
}

/// In-process counter store.
///
/// Every id maps to one [`DashMap`] entry, so all reads and writes for an id
/// run under that entry's shard lock and ids on different shards never
/// contend. Expiry is checked on access; [`CounterStore::purge_expired`] only
/// reclaims memory.
#[derive(Default)]
pub struct MemoryCounterStore {
    entries: DashMap<String, Slot>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn expiry(id: &str, now: Instant, window: Duration) -> Result<Instant, CounterError> {
    now.checked_add(window)
        .ok_or_else(|| CounterError::WindowOutOfRange(window, id.to_string()))
}

impl CounterStore for MemoryCounterStore {
    fn init_if_absent(&self, id: &str, limit: u64, window: Duration) -> Result<bool, CounterError> {
        let now = Instant::now();
        let expires_at = expiry(id, now, window)?;
        let mut slot = self.entries.entry(id.to_string()).or_default();

        if slot.live_metadata(now).is_some() {
            return Ok(false);
        }

        slot.metadata = Some(Metadata {
            limit,
            window,
            expires_at,
        });
        Ok(true)
    }

    fn put_config(&self, id: &str, limit: u64, window: Duration) -> Result<(), CounterError> {
        let expires_at = expiry(id, Instant::now(), window)?;
        let mut slot = self.entries.entry(id.to_string()).or_default();
        slot.metadata = Some(Metadata {
            limit,
            window,
            expires_at,
        });
        Ok(())
    }

    fn get_config(&self, id: &str) -> Result<Option<CachedQuota>, CounterError> {
        let now = Instant::now();
        let cached = self.entries.get(id).and_then(|slot| {
            slot.live_metadata(now).map(|meta| CachedQuota {
                limit: meta.limit,
                window: meta.window,
            })
        });
        Ok(cached)
    }

    fn increment_and_check(
        &self,
        id: &str,
        limit: u64,
        window: Duration,
    ) -> Result<Increment, CounterError> {
        let now = Instant::now();
        let expires_at = expiry(id, now, window)?;
        let mut slot = self.entries.entry(id.to_string()).or_default();

        if slot.live_window(now).is_none() {
            slot.window = None;
        }
        let current = slot.window.get_or_insert(Window {
            count: 0,
            denied: 0,
            expires_at,
        });

        let admitted = current.count < limit;
        if admitted {
            current.count += 1;
        } else {
            current.denied = current.denied.saturating_add(1);
        }

        Ok(Increment {
            count: current.count,
            admitted,
            resets_in: current.expires_at.saturating_duration_since(now),
        })
    }

    fn delete(&self, id: &str) -> Result<bool, CounterError> {
        Ok(self.entries.remove(id).is_some())
    }

    fn snapshot(&self, id: &str) -> Result<Option<CounterSnapshot>, CounterError> {
        let now = Instant::now();
        let snapshot = self.entries.get(id).and_then(|slot| {
            slot.live_window(now)
                .map(|window| to_snapshot(id, window, now))
        });
        Ok(snapshot)
    }

    fn snapshot_all(&self) -> Result<Vec<CounterSnapshot>, CounterError> {
        let now = Instant::now();
        let snapshots = self
            .entries
            .iter()
            .filter_map(|entry| {
                entry
                    .value()
                    .live_window(now)
                    .map(|window| to_snapshot(entry.key(), window, now))
            })
            .collect();
        Ok(snapshots)
    }

    fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, slot| !slot.is_expired(now));
        before.saturating_sub(self.entries.len())
    }
}

fn to_snapshot(id: &str, window: &Window, now: Instant) -> CounterSnapshot {
    CounterSnapshot {
        id: id.to_string(),
        count: window.count,
        denied: window.denied,
        resets_in: window.expires_at.saturating_duration_since(now),
    }
}
