use serde::{Deserialize, Serialize};

pub use crate::limiter::UsageReport;
pub use crate::quota::QuotaConfig;

pub const ADMITTED_MESSAGE: &str = "Request admitted";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRateLimitRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRateLimitResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub details: Option<serde_json::Value>,
}
