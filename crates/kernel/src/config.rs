//! Configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::query::pager::CountStrategy;
use crate::query::service::{ChildStrategy, SearchOptions};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Per-statement timeout applied with `SET LOCAL` (default: 10s).
    pub statement_timeout: Duration,

    /// Maximum member ids per batched order lookup (default: 100).
    pub batch_fetch_size: usize,

    /// Count strategy: "optimized" (default) or "always".
    pub count_strategy: CountStrategy,

    /// Page sizes above this are capped (default: 100).
    pub max_page_size: u32,

    /// Member cap for unpaged searches (default: 1000).
    pub unpaged_limit: u64,

    /// Order loading for unpaged searches: "batch" (default) or "flat_join".
    pub unpaged_strategy: ChildStrategy,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let statement_timeout_secs: u64 = env::var("STATEMENT_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("STATEMENT_TIMEOUT_SECS must be a valid u64")?;

        let batch_fetch_size: usize = env::var("BATCH_FETCH_SIZE")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .context("BATCH_FETCH_SIZE must be a valid usize")?;
        if batch_fetch_size == 0 {
            anyhow::bail!("BATCH_FETCH_SIZE must be at least 1");
        }

        let count_strategy = env::var("COUNT_STRATEGY")
            .unwrap_or_else(|_| "optimized".to_string())
            .parse()
            .context("COUNT_STRATEGY must be 'optimized' or 'always'")?;

        let max_page_size: u32 = env::var("MAX_PAGE_SIZE")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .context("MAX_PAGE_SIZE must be a valid u32")?;
        if max_page_size == 0 {
            anyhow::bail!("MAX_PAGE_SIZE must be at least 1");
        }

        let unpaged_limit = env::var("UNPAGED_LIMIT")
            .unwrap_or_else(|_| "1000".to_string())
            .parse()
            .context("UNPAGED_LIMIT must be a valid u64")?;

        let unpaged_strategy = env::var("UNPAGED_STRATEGY")
            .unwrap_or_else(|_| "batch".to_string())
            .parse()
            .context("UNPAGED_STRATEGY must be 'batch' or 'flat_join'")?;

        Ok(Self {
            database_url,
            database_max_connections,
            statement_timeout: Duration::from_secs(statement_timeout_secs),
            batch_fetch_size,
            count_strategy,
            max_page_size,
            unpaged_limit,
            unpaged_strategy,
        })
    }

    /// Query layer options derived from this configuration.
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            count_strategy: self.count_strategy,
            batch_size: self.batch_fetch_size,
            max_page_size: self.max_page_size,
            unpaged_limit: self.unpaged_limit,
            unpaged_strategy: self.unpaged_strategy,
        }
    }
}
