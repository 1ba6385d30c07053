pub mod database;
pub mod error;
pub mod memory;
pub mod schema;

pub use database::SqliteConfigStore;
pub use error::StorageError;
pub use memory::MemoryConfigStore;

use crate::quota::QuotaConfig;

pub const RATE_LIMITS_DB_FILENAME: &str = "rate_limits.db";

/// Durable source of truth for quota configuration.
pub trait ConfigStore: Send + Sync {
    /// Insert or overwrite the quota for `config.id`.
    fn save(&self, config: &QuotaConfig) -> Result<(), StorageError>;

    fn load(&self, id: &str) -> Result<Option<QuotaConfig>, StorageError>;

    /// Returns `true` when a row was removed.
    fn delete(&self, id: &str) -> Result<bool, StorageError>;

    fn load_all(&self) -> Result<Vec<QuotaConfig>, StorageError>;

    /// Store a usage snapshot next to the quota. Informational only.
    fn record_usage(&self, id: &str, current_requests: u64) -> Result<(), StorageError>;
}
