//! chatpay server
//!
//! ```text
//! ┌──────────┐    ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │  Config  │───▶│ AccountStore │───▶│TransferEngine│───▶│   Gateway    │
//! │  (YAML)  │    │ (memory | pg)│    │ + Dispatcher │    │ (HTTP + WS)  │
//! └──────────┘    └──────────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! Usage: `chatpay [--env dev] [--port 5001]`

use std::sync::Arc;

use anyhow::{Context, bail};
use tokio::net::TcpListener;

use chatpay::account::{AccountStore, Database, MemoryAccountStore, PgAccountStore, StoreError};
use chatpay::config::{AppConfig, StorageBackend, StorageConfig};
use chatpay::gateway::{self, handlers::health::VERSION, state::AppState};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

async fn build_store(
    config: &StorageConfig,
) -> anyhow::Result<(Arc<dyn AccountStore>, Option<Arc<Database>>)> {
    match config.backend {
        StorageBackend::Memory => Ok((Arc::new(MemoryAccountStore::new()), None)),
        StorageBackend::Postgres => {
            let url = config
                .postgres_url
                .as_deref()
                .context("storage.postgres_url (or DATABASE_URL) is required for the postgres backend")?;
            let db = Database::connect(url, config.max_connections)
                .await
                .context("Failed to connect to PostgreSQL")?;
            db.init_schema().await.context("Failed to create schema")?;
            let store = PgAccountStore::new(db.pool().clone());
            Ok((Arc::new(store), Some(Arc::new(db))))
        }
    }
}

/// Create configured accounts that do not exist yet.
async fn seed_accounts(store: &dyn AccountStore, config: &StorageConfig) -> anyhow::Result<()> {
    for seed in &config.seed_accounts {
        if let Some(id) = seed.id {
            if store.load(id).await?.is_some() {
                continue;
            }
        }
        match store.create(seed.clone()).await {
            Ok(account) => {
                tracing::info!(user_id = account.id, name = %account.full_name, "Seeded account")
            }
            Err(StoreError::AlreadyExists(id)) => {
                tracing::debug!(user_id = id, "Seed account already present")
            }
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to seed accounts")),
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env)?;
    let _log_guard = chatpay::logging::init_logging(&app_config);

    tracing::info!(version = VERSION, "Starting chatpay in {} mode", env);

    if app_config.auth.jwt_secret.is_empty() {
        bail!("auth.jwt_secret (or JWT_SECRET) must be set");
    }

    let (store, pg_db) = build_store(&app_config.storage).await?;
    seed_accounts(store.as_ref(), &app_config.storage).await?;
    tracing::info!(backend = store.name(), "Account store ready");

    let state = Arc::new(AppState::new(store, &app_config, pg_db));

    let port = get_port_override().unwrap_or(app_config.gateway.port);
    let addr = format!("{}:{}", app_config.gateway.host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {} (port in use?)", addr))?;

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("WebSocket endpoint: ws://{}/ws?userId=<id>", addr);
    tracing::info!("API Docs: http://{}/docs", addr);

    gateway::run_server(listener, state, shutdown_signal()).await?;
    tracing::info!("Server stopped");
    Ok(())
}
