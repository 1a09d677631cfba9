//! Batched one-to-many loading.
//!
//! Given a page of parents, [`BatchLoader::load`] fetches their children with
//! `ceil(n / batch_size)` lookups instead of one per parent, then distributes
//! them back in page order. The key → children map lives only for the call.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;

use super::types::Nested;
use crate::error::QueryResult;

/// Default ceiling on keys per lookup.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Loads children for a page of parents in bounded batches.
#[derive(Debug, Clone, Copy)]
pub struct BatchLoader {
    batch_size: usize,
}

impl Default for BatchLoader {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl BatchLoader {
    /// Loader with at most `batch_size` keys per lookup (minimum 1).
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Attach children to `parents`.
    ///
    /// `fetch` is called once per chunk of distinct parent keys and must return
    /// the children whose `child_key` is in that chunk. Children keep their
    /// fetch order within each parent. Parents without children get an empty
    /// list; children for keys that were not requested are dropped.
    pub async fn load<P, C, K, PK, CK, F, Fut>(
        &self,
        parents: Vec<P>,
        parent_key: PK,
        child_key: CK,
        mut fetch: F,
    ) -> QueryResult<Vec<Nested<P, C>>>
    where
        K: Eq + Hash + Copy + Debug,
        PK: Fn(&P) -> K,
        CK: Fn(&C) -> K,
        F: FnMut(Vec<K>) -> Fut,
        Fut: Future<Output = QueryResult<Vec<C>>>,
    {
        if parents.is_empty() {
            return Ok(Vec::new());
        }

        // Deduplicate while keeping page order
        let mut seen = HashSet::new();
        let keys: Vec<K> = parents
            .iter()
            .map(&parent_key)
            .filter(|key| seen.insert(*key))
            .collect();

        let mut grouped: HashMap<K, Vec<C>> = HashMap::with_capacity(keys.len());
        let mut batches = 0usize;
        let mut stray = 0usize;

        for chunk in keys.chunks(self.batch_size) {
            batches += 1;
            for child in fetch(chunk.to_vec()).await? {
                let key = child_key(&child);
                if seen.contains(&key) {
                    grouped.entry(key).or_default().push(child);
                } else {
                    stray += 1;
                }
            }
        }

        if stray > 0 {
            tracing::warn!(stray, "batch lookup returned children for unrequested keys");
        }
        tracing::debug!(
            parents = parents.len(),
            keys = keys.len(),
            batches,
            batch_size = self.batch_size,
            "children batch loaded"
        );

        // A parent key repeated on the page gets the children only once.
        Ok(parents
            .into_iter()
            .map(|parent| {
                let children = grouped.remove(&parent_key(&parent)).unwrap_or_default();
                Nested::new(parent, children)
            })
            .collect())
    }
}
