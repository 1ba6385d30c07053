use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::serve;
use rate_limiter::{
    create_router, AdmissionEngine, ApiState, MemoryCounterStore, RateLimiterConfig,
    SqliteConfigStore,
};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = RateLimiterConfig::from_env().context("failed to load configuration")?;
    init_tracing(&config)?;

    info!(
        host = %config.server_host,
        port = config.server_port,
        data_dir = %config.data_dir.display(),
        "starting rate-limiter service"
    );

    // Without the durable store there are no known quotas to enforce.
    let config_store = Arc::new(
        SqliteConfigStore::open(&config.data_dir, config.db_busy_timeout())
            .context("failed to open config store")?,
    );
    let counter_store = Arc::new(MemoryCounterStore::new());
    let engine = AdmissionEngine::new(config_store, counter_store);

    let report = engine
        .hydrator()
        .hydrate_all()
        .context("failed to hydrate counter store from config store")?;
    info!(
        loaded = report.loaded,
        failed = report.failed,
        "restored rate limiters from persistence"
    );

    let _sweeper_task = engine.start_sweeper_task(config.sweep_interval());
    let _snapshot_task = config
        .usage_snapshot_interval()
        .map(|every| engine.start_usage_snapshot_task(every));

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port)
        .parse()
        .context("invalid server bind address")?;
    let state = Arc::new(ApiState::new(engine, config));
    let router = create_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .context("failed to bind TCP listener")?;
    let local_addr = listener
        .local_addr()
        .context("failed to read bound address")?;
    info!(%local_addr, "rate-limiter listening");

    serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server encountered an unrecoverable error")?;

    info!("rate-limiter service shutting down");
    Ok(())
}

fn init_tracing(config: &RateLimiterConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
