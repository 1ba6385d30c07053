use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, warn};

use super::engine::AdmissionEngine;
use super::error::AdmissionError;

impl AdmissionEngine {
    /// Reclaim counter entries whose metadata and window have both expired.
    pub fn sweep_expired(&self) -> usize {
        self.counter_store.purge_expired()
    }

    /// Copy live counts into the config store's informational usage column.
    pub fn persist_usage(&self) -> Result<usize, AdmissionError> {
        let snapshots = self.counter_store.snapshot_all()?;
        let mut persisted = 0usize;

        for snapshot in snapshots {
            match self.config_store.record_usage(&snapshot.id, snapshot.count) {
                Ok(()) => persisted += 1,
                Err(err) => {
                    warn!(id = %snapshot.id, error = %err, "failed to record usage snapshot");
                }
            }
        }

        Ok(persisted)
    }

    pub fn start_sweeper_task(&self, every: Duration) -> JoinHandle<()> {
        let engine = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let purged = engine.sweep_expired();
                if purged > 0 {
                    debug!(purged, "evicted expired counter entries");
                }
            }
        })
    }

    pub fn start_usage_snapshot_task(&self, every: Duration) -> JoinHandle<()> {
        let engine = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                match engine.persist_usage() {
                    Ok(count) if count > 0 => {
                        debug!(persisted = count, "persisted usage snapshots");
                    }
                    Ok(_) => {
                        debug!("no live windows to persist");
                    }
                    Err(err) => {
                        error!(error = %err, "failed to persist usage snapshots");
                    }
                }
            }
        })
    }
}
