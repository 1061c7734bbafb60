//! Composition root
//!
//! Explicit construction, outermost last: config, logging, database pool,
//! cache connection, stores, coordinator, HTTP gateway.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use wallet_service::cache::RedisCache;
use wallet_service::config::AppConfig;
use wallet_service::db::Database;
use wallet_service::gateway::{self, state::AppState};
use wallet_service::interest::{InterestService, InterestStore};
use wallet_service::ledger::LedgerStore;
use wallet_service::logging::init_logging;
use wallet_service::transfer::TransferCoordinator;
use wallet_service::txlog::TxLogStore;
use wallet_service::wallet::WalletStore;

#[tokio::main]
async fn main() -> Result<()> {
    let env = std::env::var("APP_ENV").unwrap_or_else(|_| "default".to_string());
    let config = AppConfig::load(&env)?;

    let _log_guard = init_logging(&config);
    info!(env = %env, git_hash = env!("GIT_HASH"), "wallet-service starting");

    let db = Arc::new(
        Database::connect(&config.database)
            .await
            .context("Failed to connect to PostgreSQL")?,
    );

    sqlx::migrate!("./migrations")
        .run(db.pool())
        .await
        .context("Failed to run database migrations")?;

    let cache = Arc::new(
        RedisCache::connect(
            &config.cache.url,
            Duration::from_millis(config.cache.retry_backoff_ms),
        )
        .await
        .context("Failed to connect to cache")?,
    );

    let wallets = Arc::new(WalletStore::new(db.pool().clone()));
    let logs = Arc::new(TxLogStore::new(db.pool().clone()));
    let ledger = Arc::new(LedgerStore::new(db.pool().clone()));
    let accruals = Arc::new(InterestStore::new(db.pool().clone()));

    let coordinator = Arc::new(TransferCoordinator::new(
        db.pool().clone(),
        wallets.clone(),
        logs.clone(),
        ledger,
        cache,
        config.transfer.limits(),
    ));
    let interest = Arc::new(InterestService::new(wallets.clone(), accruals));

    let state = Arc::new(AppState {
        coordinator,
        wallets,
        logs,
        interest,
        db,
    });

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(addr = %addr, "Gateway listening");

    axum::serve(listener, gateway::router(state))
        .await
        .context("Gateway server error")?;

    Ok(())
}
