//! Total-count resolution with count-query elision.
//!
//! The content query always runs first. With [`CountStrategy::Optimized`]
//! the total is inferred from the page boundary when the page is provably the
//! last one; otherwise the count query runs.

use std::future::Future;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::types::PageSpec;
use crate::error::QueryResult;

/// How the total row count of a page is obtained.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CountStrategy {
    /// Always run the count query.
    Always,
    /// Skip the count query when the page boundary proves the total.
    #[default]
    Optimized,
}

impl FromStr for CountStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(CountStrategy::Always),
            "optimized" => Ok(CountStrategy::Optimized),
            other => anyhow::bail!("unknown count strategy '{other}' (expected always|optimized)"),
        }
    }
}

/// Infer the total from a page's content length, if the boundary proves it.
///
/// A short page is the last page: on the first page its length is the total,
/// on a later page the total is `offset + len`. A full page proves nothing.
pub fn infer_total(page: &PageSpec, content_len: usize) -> Option<u64> {
    let len = content_len as u64;
    if len >= u64::from(page.size()) {
        return None;
    }
    if page.is_first() {
        Some(len)
    } else {
        Some(page.offset() + len)
    }
}

/// Resolve the total for a page whose content has already been fetched.
///
/// `count` is only awaited when the strategy requires it.
pub async fn resolve_total<F, Fut>(
    strategy: CountStrategy,
    page: &PageSpec,
    content_len: usize,
    count: F,
) -> QueryResult<u64>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = QueryResult<u64>>,
{
    if strategy == CountStrategy::Optimized
        && let Some(total) = infer_total(page, content_len)
    {
        tracing::debug!(
            offset = page.offset(),
            size = page.size(),
            total,
            "count query elided"
        );
        return Ok(total);
    }

    count().await
}
