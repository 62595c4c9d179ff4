//! Job Ledger - Main Entry Point

mod config;
mod telemetry;

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

// Import workspace crates
use config::DaemonConfig;
use jobledger_api_rpc::{RpcServer, RpcServerConfig};
use jobledger_core::error::AppError;
use jobledger_core::port::id_provider::UuidProvider;
use jobledger_core::port::time_provider::SystemTimeProvider;
use jobledger_core::port::DocumentStore;
use jobledger_core::PersistenceGateway;
use jobledger_infra_sqlite::{create_pool, run_migrations, PoolConfig, SqliteDocumentStore};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let config = DaemonConfig::from_env()?;

    // 2. Initialize logging
    let _log_guard = telemetry::init(&config)?;

    info!("Job Ledger v{} starting...", VERSION);

    // 3. One-shot primary store session; failure means fallback mode for the process lifetime
    let gateway =
        Arc::new(PersistenceGateway::initialize(connect_primary(config.db_path.clone())).await);
    info!(primary = ?gateway.availability(), "Persistence gateway ready");

    // 4. Start JSON-RPC server
    let rpc_config = RpcServerConfig {
        host: config.rpc_host.clone(),
        port: config.rpc_port,
        rate_limit_burst: config.rate_limit_burst,
        rate_limit_rate: config.rate_limit_rate,
    };
    let (addr, rpc_handle) = RpcServer::new(rpc_config, gateway)
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!(addr = %addr, "System ready. Press Ctrl+C to shutdown");

    // 5. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), rpc_handle.stopped()).await;

    info!("Shutdown complete.");

    Ok(())
}

/// Open the SQLite database and bring its schema up to date
async fn connect_primary(
    db_path: Option<PathBuf>,
) -> jobledger_core::Result<Arc<dyn DocumentStore>> {
    let db_path =
        db_path.ok_or_else(|| AppError::Config("JOBLEDGER_DB_PATH is empty".to_string()))?;

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            AppError::Config(format!("Cannot create {}: {}", parent.display(), e))
        })?;
    }

    info!(db_path = %db_path.display(), "Initializing database...");

    let pool = create_pool(&db_path.to_string_lossy(), &PoolConfig::default()).await?;
    run_migrations(&pool).await?;

    Ok(Arc::new(SqliteDocumentStore::new(
        pool,
        Arc::new(UuidProvider),
        Arc::new(SystemTimeProvider),
    )))
}
