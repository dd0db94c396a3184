//! Branchguard - Main Entry Point
//! Participant daemon: SQLite ledger + business tables behind JSON-RPC

mod config;

use anyhow::{Context, Result};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use branchguard_api_rpc::handler::{Repositories, RpcHandler};
use branchguard_api_rpc::{server::RpcServerConfig, RpcServer, RpcUserDirectory};
use branchguard_core::application::Barrier;
use branchguard_core::port::time_provider::SystemTimeProvider;
use branchguard_core::port::user_directory::AcceptAllUsers;
use branchguard_core::port::UserDirectory;
use branchguard_infra_sqlite::{
    create_pool, run_migrations, SqliteOrderRepository, SqliteProductRepository, SqliteStore,
};
use config::{DaemonConfig, LogFormat};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const SHUTDOWN_DRAIN: Duration = Duration::from_secs(5);

/// Wait for in-flight calls to finish; false if the deadline passed first
async fn drain<F: Future<Output = ()>>(stopped: F, deadline: Duration) -> bool {
    tokio::time::timeout(deadline, stopped).await.is_ok()
}

fn init_logging(config: &DaemonConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("branchguard=info"))
        .context("Failed to create env filter")?;

    // Optional JSON file sink, rotated daily
    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "branchguard.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().json().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    match config.log_format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
    }

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Configuration and logging
    let config = DaemonConfig::from_env()?;
    let _log_guard = init_logging(&config)?;

    info!("Branchguard v{} starting...", VERSION);

    // 2. Database
    if let Some(parent) = Path::new(&config.db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    info!(db_path = %config.db_path, "Initializing database...");
    let pool = create_pool(&config.db_path)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 3. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let store = Arc::new(SqliteStore::new(pool.clone(), time_provider.clone()));

    let mut barrier = Barrier::new(store.clone());
    if let Some(timeout) = config.branch_timeout {
        info!(timeout_ms = timeout.as_millis() as u64, "Branch deadline enabled");
        barrier = barrier.with_timeout(timeout);
    }

    let users: Arc<dyn UserDirectory> = match &config.user_rpc_url {
        Some(url) => {
            info!(url = %url, "Checking users against the user service");
            Arc::new(
                RpcUserDirectory::new(url)
                    .map_err(|e| anyhow::anyhow!("User service client failed: {}", e))?,
            )
        }
        None => {
            warn!("BRANCHGUARD_USER_RPC_URL not set, accepting every user");
            Arc::new(AcceptAllUsers)
        }
    };

    let repos = Repositories {
        products: Arc::new(SqliteProductRepository::new(pool.clone(), time_provider)),
        orders: Arc::new(SqliteOrderRepository::new(pool.clone())),
        ledger: store,
    };

    // 4. Start JSON-RPC server
    info!("Starting JSON-RPC server...");
    let rpc_config = RpcServerConfig {
        host: config.rpc_host.clone(),
        port: config.rpc_port,
    };
    let handler = RpcHandler::new(barrier, users, repos);
    let (addr, rpc_handle) = RpcServer::new(rpc_config, handler)
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!(addr = %addr, "System ready. Waiting for branch calls...");
    info!("Press Ctrl+C to shutdown");

    // 5. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 6. Graceful shutdown: stop accepting calls, let in-flight branches finish
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    if !drain(rpc_handle.stopped(), SHUTDOWN_DRAIN).await {
        warn!(
            deadline_secs = SHUTDOWN_DRAIN.as_secs(),
            "In-flight branches did not drain; their transactions roll back"
        );
    }
    pool.close().await;

    info!("Shutdown complete.");

    Ok(())
}
