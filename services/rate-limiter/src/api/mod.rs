use std::sync::Arc;

pub mod handlers;
pub mod router;
pub mod types;

pub use router::create_router;
pub use types::*;

use crate::config::RateLimiterConfig;
use crate::limiter::AdmissionEngine;

pub struct ApiState {
    pub engine: AdmissionEngine,
    pub config: Arc<RateLimiterConfig>,
}

impl ApiState {
    pub fn new(engine: AdmissionEngine, config: RateLimiterConfig) -> Self {
        Self {
            engine,
            config: Arc::new(config),
        }
    }
}
