#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rate_limiter::counter::{CachedQuota, CounterSnapshot, Increment};
use rate_limiter::{
    AdmissionEngine, ConfigStore, CounterError, CounterStore, MemoryConfigStore,
    MemoryCounterStore, QuotaConfig, StorageError,
};

pub fn quota(id: &str, limit: u64, reset_after: u64) -> QuotaConfig {
    QuotaConfig::new(id, limit, reset_after).expect("test quota should be valid")
}

pub fn memory_engine() -> AdmissionEngine {
    AdmissionEngine::new(
        Arc::new(MemoryConfigStore::new()),
        Arc::new(MemoryCounterStore::new()),
    )
}

/// Counter store whose individual operations can be made to fail.
#[derive(Default)]
pub struct FlakyCounterStore {
    pub inner: MemoryCounterStore,
    pub fail_put_config: AtomicBool,
    pub fail_delete: AtomicBool,
    pub fail_reads: AtomicBool,
    pub fail_init_ids: Mutex<HashSet<String>>,
}

impl FlakyCounterStore {
    pub fn fail_init_for(&self, id: &str) {
        self.fail_init_ids.lock().unwrap().insert(id.to_string());
    }

    fn unavailable(op: &str) -> CounterError {
        CounterError::Unavailable(format!("{op} failed by test"))
    }
}

impl CounterStore for FlakyCounterStore {
    fn init_if_absent(&self, id: &str, limit: u64, window: Duration) -> Result<bool, CounterError> {
        if self.fail_init_ids.lock().unwrap().contains(id) {
            return Err(Self::unavailable("init_if_absent"));
        }
        self.inner.init_if_absent(id, limit, window)
    }

    fn put_config(&self, id: &str, limit: u64, window: Duration) -> Result<(), CounterError> {
        if self.fail_put_config.load(Ordering::SeqCst) {
            return Err(Self::unavailable("put_config"));
        }
        self.inner.put_config(id, limit, window)
    }

    fn get_config(&self, id: &str) -> Result<Option<CachedQuota>, CounterError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::unavailable("get_config"));
        }
        self.inner.get_config(id)
    }

    fn increment_and_check(
        &self,
        id: &str,
        limit: u64,
        window: Duration,
    ) -> Result<Increment, CounterError> {
        self.inner.increment_and_check(id, limit, window)
    }

    fn delete(&self, id: &str) -> Result<bool, CounterError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Self::unavailable("delete"));
        }
        self.inner.delete(id)
    }

    fn snapshot(&self, id: &str) -> Result<Option<CounterSnapshot>, CounterError> {
        self.inner.snapshot(id)
    }

    fn snapshot_all(&self) -> Result<Vec<CounterSnapshot>, CounterError> {
        self.inner.snapshot_all()
    }

    fn purge_expired(&self) -> usize {
        self.inner.purge_expired()
    }
}

/// Config store that behaves like an unreachable database.
pub struct UnreachableConfigStore;

impl UnreachableConfigStore {
    fn unavailable() -> StorageError {
        StorageError::Unavailable("connection refused".into())
    }
}

impl ConfigStore for UnreachableConfigStore {
    fn save(&self, _config: &QuotaConfig) -> Result<(), StorageError> {
        Err(Self::unavailable())
    }

    fn load(&self, _id: &str) -> Result<Option<QuotaConfig>, StorageError> {
        Err(Self::unavailable())
    }

    fn delete(&self, _id: &str) -> Result<bool, StorageError> {
        Err(Self::unavailable())
    }

    fn load_all(&self) -> Result<Vec<QuotaConfig>, StorageError> {
        Err(Self::unavailable())
    }

    fn record_usage(&self, _id: &str, _current_requests: u64) -> Result<(), StorageError> {
        Err(Self::unavailable())
    }
}

/// Config store that, once armed, deletes an id from both stores right after
/// handing out its row, as a concurrent operator delete would.
pub struct DeleteAfterLoadStore {
    pub inner: MemoryConfigStore,
    pub counters: Arc<MemoryCounterStore>,
    pub armed: AtomicBool,
}

impl DeleteAfterLoadStore {
    pub fn new(counters: Arc<MemoryCounterStore>) -> Self {
        Self {
            inner: MemoryConfigStore::new(),
            counters,
            armed: AtomicBool::new(false),
        }
    }
}

impl ConfigStore for DeleteAfterLoadStore {
    fn save(&self, config: &QuotaConfig) -> Result<(), StorageError> {
        self.inner.save(config)
    }

    fn load(&self, id: &str) -> Result<Option<QuotaConfig>, StorageError> {
        let row = self.inner.load(id)?;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.inner.delete(id)?;
            self.counters.delete(id).expect("in-memory delete cannot fail");
        }
        Ok(row)
    }

    fn delete(&self, id: &str) -> Result<bool, StorageError> {
        self.inner.delete(id)
    }

    fn load_all(&self) -> Result<Vec<QuotaConfig>, StorageError> {
        self.inner.load_all()
    }

    fn record_usage(&self, id: &str, current_requests: u64) -> Result<(), StorageError> {
        self.inner.record_usage(id, current_requests)
    }
}
