use dashmap::DashMap;

use crate::quota::QuotaConfig;

use super::{ConfigStore, StorageError};

#[derive(Debug, Clone)]
struct StoredQuota {
    config: QuotaConfig,
    current_requests: u64,
}

/// Non-persistent config store for tests and throwaway deployments.
#[derive(Default)]
pub struct MemoryConfigStore {
    rows: DashMap<String, StoredQuota>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_requests(&self, id: &str) -> Option<u64> {
        self.rows.get(id).map(|row| row.current_requests)
    }
}

impl ConfigStore for MemoryConfigStore {
    fn save(&self, config: &QuotaConfig) -> Result<(), StorageError> {
        self.rows
            .entry(config.id.clone())
            .and_modify(|row| row.config = config.clone())
            .or_insert_with(|| StoredQuota {
                config: config.clone(),
                current_requests: 0,
            });
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Option<QuotaConfig>, StorageError> {
        Ok(self.rows.get(id).map(|row| row.config.clone()))
    }

    fn delete(&self, id: &str) -> Result<bool, StorageError> {
        Ok(self.rows.remove(id).is_some())
    }

    fn load_all(&self) -> Result<Vec<QuotaConfig>, StorageError> {
        let mut configs: Vec<QuotaConfig> =
            self.rows.iter().map(|row| row.config.clone()).collect();
        configs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(configs)
    }

    fn record_usage(&self, id: &str, current_requests: u64) -> Result<(), StorageError> {
        if let Some(mut row) = self.rows.get_mut(id) {
            row.current_requests = current_requests;
        }
        Ok(())
    }
}
