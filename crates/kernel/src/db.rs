//! Database connection pool management.

use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::Config;
use crate::store::PgStore;

/// Create a PostgreSQL connection pool.
pub async fn create_pool(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(config.statement_timeout)
        .connect(&config.database_url)
        .await
        .context("failed to connect to PostgreSQL")?;

    tracing::debug!(
        max_connections = config.database_max_connections,
        "database pool created"
    );
    Ok(pool)
}

/// Connect and wrap the pool in a [`PgStore`] using the configured timeout.
pub async fn connect_store(config: &Config) -> Result<PgStore> {
    let pool = create_pool(config).await?;
    Ok(PgStore::new(pool, config.statement_timeout))
}

/// Check if the database connection is healthy.
pub async fn check_health(pool: &PgPool) -> bool {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .is_ok()
}
