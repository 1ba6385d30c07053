use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    pub server_host: String,
    pub server_port: u16,
    pub data_dir: PathBuf,
    pub db_busy_timeout_ms: u64,
    pub request_timeout_secs: u64,
    pub sweep_interval_secs: u64,
    /// Zero disables the usage snapshot task.
    pub usage_snapshot_interval_secs: u64,
    pub log_level: String,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            data_dir: PathBuf::from("data/rate-limiter"),
            db_busy_timeout_ms: 5_000,
            request_timeout_secs: 30,
            sweep_interval_secs: 30,
            usage_snapshot_interval_secs: 60,
            log_level: "info".to_string(),
        }
    }
}

impl RateLimiterConfig {
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();

        if let Ok(host) = env::var("RATE_LIMITER_HOST") {
            cfg.server_host = host;
        }
        if let Ok(port) = env::var("RATE_LIMITER_PORT") {
            cfg.server_port = port
                .parse()
                .context("RATE_LIMITER_PORT must be a valid u16")?;
        }
        if let Ok(dir) = env::var("RATE_LIMITER_DATA_DIR") {
            cfg.data_dir = PathBuf::from(dir);
        }
        if let Ok(timeout) = env::var("DB_BUSY_TIMEOUT_MS") {
            cfg.db_busy_timeout_ms = timeout
                .parse()
                .context("DB_BUSY_TIMEOUT_MS must be a positive integer")?;
        }
        if let Ok(timeout) = env::var("REQUEST_TIMEOUT_SECS") {
            cfg.request_timeout_secs = timeout
                .parse()
                .context("REQUEST_TIMEOUT_SECS must be a positive integer")?;
        }
        if let Ok(interval) = env::var("SWEEP_INTERVAL_SECS") {
            cfg.sweep_interval_secs = interval
                .parse()
                .context("SWEEP_INTERVAL_SECS must be a positive integer")?;
        }
        if let Ok(interval) = env::var("USAGE_SNAPSHOT_INTERVAL_SECS") {
            cfg.usage_snapshot_interval_secs = interval
                .parse()
                .context("USAGE_SNAPSHOT_INTERVAL_SECS must be a non-negative integer")?;
        }
        if let Ok(level) = env::var("LOG_LEVEL") {
            cfg.log_level = level;
        }

        cfg.validate()?;
        ensure_directory(&cfg.data_dir)?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server_host.trim().is_empty() {
            anyhow::bail!("RATE_LIMITER_HOST cannot be empty");
        }
        if self.db_busy_timeout_ms == 0 {
            anyhow::bail!("DB_BUSY_TIMEOUT_MS must be greater than zero");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_SECS must be greater than zero");
        }
        if self.sweep_interval_secs == 0 {
            anyhow::bail!("SWEEP_INTERVAL_SECS must be greater than zero");
        }

        Ok(())
    }

    pub fn db_busy_timeout(&self) -> Duration {
        Duration::from_millis(self.db_busy_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn usage_snapshot_interval(&self) -> Option<Duration> {
        (self.usage_snapshot_interval_secs > 0)
            .then(|| Duration::from_secs(self.usage_snapshot_interval_secs))
    }
}

fn ensure_directory(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            anyhow::bail!("{} exists but is not a directory", path.display());
        }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("unable to create data directory {}", path.display()))?;
    }
    Ok(())
}
