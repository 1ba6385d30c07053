use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::counter::CounterStore;
use crate::quota::QuotaConfig;
use crate::storage::{ConfigStore, StorageError};

use super::error::AdmissionError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HydrationReport {
    pub loaded: usize,
    pub initialized: usize,
    pub already_live: usize,
    pub failed: usize,
}

/// Copies durable quota configuration into the counter store.
#[derive(Clone)]
pub struct Hydrator {
    config_store: Arc<dyn ConfigStore>,
    counter_store: Arc<dyn CounterStore>,
}

impl Hydrator {
    pub fn new(config_store: Arc<dyn ConfigStore>, counter_store: Arc<dyn CounterStore>) -> Self {
        Self {
            config_store,
            counter_store,
        }
    }

    /// Cache every configured quota. Only a failure to read the config store is
    /// returned; ids that fail to cache are counted and left to the cold path.
    pub fn hydrate_all(&self) -> Result<HydrationReport, StorageError> {
        let configs = self.config_store.load_all()?;
        let mut report = HydrationReport {
            loaded: configs.len(),
            ..HydrationReport::default()
        };

        for config in configs {
            match self
                .counter_store
                .init_if_absent(&config.id, config.limit, config.window())
            {
                Ok(true) => report.initialized += 1,
                Ok(false) => report.already_live += 1,
                Err(err) => {
                    warn!(id = %config.id, error = %err, "failed to hydrate rate limiter");
                    report.failed += 1;
                }
            }
        }

        info!(
            loaded = report.loaded,
            initialized = report.initialized,
            already_live = report.already_live,
            failed = report.failed,
            "hydrated counter store"
        );
        Ok(report)
    }

    /// Cache the quota for one id. Returns `None` when the id is not configured,
    /// after dropping anything the counter store still holds for it.
    pub fn hydrate_one(&self, id: &str) -> Result<Option<QuotaConfig>, AdmissionError> {
        let Some(config) = self.config_store.load(id)? else {
            self.purge(id);
            return Ok(None);
        };

        let created = self
            .counter_store
            .init_if_absent(id, config.limit, config.window())?;
        debug!(id, created, "hydrated rate limiter on demand");

        // A delete between the load and the cache write would otherwise leave
        // live metadata for an id the config store no longer has.
        if created && self.config_store.load(id)?.is_none() {
            debug!(id, "rate limiter deleted during hydration");
            self.purge(id);
            return Ok(None);
        }

        Ok(Some(config))
    }

    fn purge(&self, id: &str) {
        if let Err(err) = self.counter_store.delete(id) {
            warn!(id, error = %err, "failed to purge counter residue for unknown id");
        }
    }
}
