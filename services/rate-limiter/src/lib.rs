//! Quota admission backed by two stores: a durable config store holding each
//! id's limit and window, and a fast counter store holding live counts.

pub mod api;
pub mod config;
pub mod counter;
pub mod limiter;
pub mod quota;
pub mod storage;

pub use api::{create_router, ApiState, ErrorResponse};
pub use config::RateLimiterConfig;
pub use counter::{CounterError, CounterStore, MemoryCounterStore};
pub use limiter::{AdmissionEngine, AdmissionError, Decision, HydrationReport, Hydrator, UsageReport};
pub use quota::QuotaConfig;
pub use storage::{ConfigStore, MemoryConfigStore, SqliteConfigStore, StorageError};
