use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use tokio::sync::OnceCell;

use crate::config::DbConfig;
use crate::error::StoreError;

/// Each warm execution context handles one event at a time, so the pool
/// stays small.
const MAX_CONNECTIONS: u32 = 2;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

static POOL: OnceCell<PgPool> = OnceCell::const_new();

/// Connect on first use and reuse the pool for the lifetime of the
/// execution context. A failed connect leaves the cell empty, so the next
/// invocation retries instead of caching the failure.
pub async fn shared_pool(config: &DbConfig) -> Result<&'static PgPool, StoreError> {
    POOL.get_or_try_init(|| async { connect(config).await }).await
}

async fn connect(config: &DbConfig) -> Result<PgPool, StoreError> {
    tracing::info!("Opening database pool for {}@{}", config.user, config.host);

    let options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.name)
        .username(&config.user)
        .password(&config.password)
        .ssl_mode(if config.require_tls {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        });

    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await?;

    Ok(pool)
}
