use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::counter::{CachedQuota, CounterStore};
use crate::quota::QuotaConfig;
use crate::storage::ConfigStore;

use super::decision::{Decision, UsageReport};
use super::error::AdmissionError;
use super::hydrator::Hydrator;

/// Admission decisions and quota configuration across both stores.
///
/// Configuration writes commit to the config store first and then refresh
/// the counter store. A failed counter-store write is logged and left for
/// the cold path in [`AdmissionEngine::check`] to repair, so the two stores
/// are eventually consistent rather than transactional.
#[derive(Clone)]
pub struct AdmissionEngine {
    pub(super) config_store: Arc<dyn ConfigStore>,
    pub(super) counter_store: Arc<dyn CounterStore>,
    hydrator: Hydrator,
}

impl AdmissionEngine {
    pub fn new(config_store: Arc<dyn ConfigStore>, counter_store: Arc<dyn CounterStore>) -> Self {
        let hydrator = Hydrator::new(Arc::clone(&config_store), Arc::clone(&counter_store));
        Self {
            config_store,
            counter_store,
            hydrator,
        }
    }

    pub fn hydrator(&self) -> &Hydrator {
        &self.hydrator
    }

    /// Count one request for `id` against its quota.
    ///
    /// Cached metadata serves the fast path. On a miss the quota is hydrated
    /// from the config store and the fast path is retried once.
    pub fn check(&self, id: &str) -> Result<Decision, AdmissionError> {
        ensure_id(id)?;

        if let Some(cached) = self.counter_store.get_config(id)? {
            return self.admit(id, cached);
        }

        debug!(id, "counter store miss, hydrating from config store");
        let config = self
            .hydrator
            .hydrate_one(id)?
            .ok_or_else(|| AdmissionError::NotFound(id.to_string()))?;

        // A concurrent delete can drop the fresh metadata; the durable copy we
        // just read is still the best answer for this request.
        let cached = self
            .counter_store
            .get_config(id)?
            .unwrap_or(CachedQuota {
                limit: config.limit,
                window: config.window(),
            });
        self.admit(id, cached)
    }

    pub fn create(&self, config: QuotaConfig) -> Result<QuotaConfig, AdmissionError> {
        config.validate()?;
        self.write_through(&config)?;
        info!(id = %config.id, limit = config.limit, reset_after = config.reset_after, "rate limiter created");
        Ok(config)
    }

    pub fn update(&self, id: &str, config: QuotaConfig) -> Result<QuotaConfig, AdmissionError> {
        ensure_id(id)?;
        if self.config_store.load(id)?.is_none() {
            return Err(AdmissionError::NotFound(id.to_string()));
        }
        if config.id != id {
            return Err(AdmissionError::InvalidInput(format!(
                "body id {} does not match {}",
                config.id, id
            )));
        }
        config.validate()?;

        self.write_through(&config)?;
        info!(id, limit = config.limit, reset_after = config.reset_after, "rate limiter updated");
        Ok(config)
    }

    /// Returns `true` when the id was configured.
    pub fn delete(&self, id: &str) -> Result<bool, AdmissionError> {
        ensure_id(id)?;
        let existed = self.config_store.delete(id)?;

        if let Err(err) = self.counter_store.delete(id) {
            warn!(id, error = %err, "counter store delete failed; residue is purged on next check");
        }

        info!(id, existed, "rate limiter deleted");
        Ok(existed)
    }

    pub fn get(&self, id: &str) -> Result<QuotaConfig, AdmissionError> {
        ensure_id(id)?;
        self.config_store
            .load(id)?
            .ok_or_else(|| AdmissionError::NotFound(id.to_string()))
    }

    pub fn list(&self) -> Result<Vec<QuotaConfig>, AdmissionError> {
        Ok(self.config_store.load_all()?)
    }

    pub fn usage(&self, id: &str) -> Result<UsageReport, AdmissionError> {
        let config = self.get(id)?;
        let window = self.counter_store.snapshot(id)?;
        Ok(UsageReport::new(&config, window.as_ref()))
    }

    fn admit(&self, id: &str, quota: CachedQuota) -> Result<Decision, AdmissionError> {
        let outcome = self
            .counter_store
            .increment_and_check(id, quota.limit, quota.window)?;

        if outcome.admitted {
            debug!(id, count = outcome.count, limit = quota.limit, "request admitted");
            Ok(Decision::Admitted {
                count: outcome.count,
                limit: quota.limit,
            })
        } else {
            debug!(id, count = outcome.count, limit = quota.limit, "request denied");
            Ok(Decision::Denied {
                count: outcome.count,
                limit: quota.limit,
                retry_after: outcome.resets_in,
            })
        }
    }

    fn write_through(&self, config: &QuotaConfig) -> Result<(), AdmissionError> {
        self.config_store.save(config)?;

        if let Err(err) = self
            .counter_store
            .put_config(&config.id, config.limit, config.window())
        {
            warn!(
                id = %config.id,
                error = %err,
                "counter store write failed; quota will be hydrated on next check"
            );
        }
        Ok(())
    }
}

fn ensure_id(id: &str) -> Result<(), AdmissionError> {
    if id.trim().is_empty() {
        return Err(AdmissionError::InvalidInput("id cannot be empty".into()));
    }
    Ok(())
}
