//! Member search service.
//!
//! Request flow: compose the predicate, run the content query, resolve the
//! total (count query only when needed), then attach orders. Each step awaits
//! the previous one; a failure stops the request before any dependent query.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::batch_loader::{BatchLoader, DEFAULT_BATCH_SIZE};
use super::executor::{QueryExecutor, with_tie_breaker};
use super::flat_join::{aggregate, paginate};
use super::pager::{CountStrategy, resolve_total};
use super::predicate::{Predicate, compose};
use super::types::{PageResult, PageSpec, SearchCondition};
use crate::error::{QueryError, QueryResult, QueryStage};
use crate::models::{MemberOrders, MemberTeamRow, OrderRow};
use crate::store::QueryStore;

/// How `search` loads the orders of an unpaged result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChildStrategy {
    /// Member query, then batched order lookups.
    #[default]
    Batch,
    /// One member × order outer join, aggregated in memory.
    FlatJoin,
}

impl FromStr for ChildStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "batch" => Ok(ChildStrategy::Batch),
            "flat_join" | "flat-join" => Ok(ChildStrategy::FlatJoin),
            other => anyhow::bail!("unknown child strategy '{other}' (expected batch|flat_join)"),
        }
    }
}

/// Default page size ceiling.
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

/// Default member cap for unpaged searches.
pub const DEFAULT_UNPAGED_LIMIT: u64 = 1000;

/// Tunables for [`MemberSearchService`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchOptions {
    pub count_strategy: CountStrategy,
    pub batch_size: usize,
    pub max_page_size: u32,
    pub unpaged_limit: u64,
    pub unpaged_strategy: ChildStrategy,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            count_strategy: CountStrategy::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            unpaged_limit: DEFAULT_UNPAGED_LIMIT,
            unpaged_strategy: ChildStrategy::default(),
        }
    }
}

/// Searches members and their orders.
#[derive(Clone)]
pub struct MemberSearchService {
    store: Arc<dyn QueryStore>,
    executor: QueryExecutor,
    loader: BatchLoader,
    options: SearchOptions,
}

impl MemberSearchService {
    pub fn new(store: Arc<dyn QueryStore>, options: SearchOptions) -> Self {
        Self {
            executor: QueryExecutor::new(store.clone()),
            loader: BatchLoader::new(options.batch_size),
            store,
            options,
        }
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// All matching members with their orders, capped at `unpaged_limit`.
    pub async fn search(&self, condition: &SearchCondition) -> QueryResult<Vec<MemberOrders>> {
        let predicate = compose(condition);
        let limit = self.options.unpaged_limit;

        let nested = match self.options.unpaged_strategy {
            ChildStrategy::Batch => {
                let members = self.executor.fetch_unpaged(&predicate, &[], limit).await?;
                self.attach_orders(members).await?
            }
            ChildStrategy::FlatJoin => {
                let rows = self
                    .store
                    .fetch_member_orders_flat(&predicate, &with_tie_breaker(&[]))
                    .await
                    .map_err(|e| QueryError::execution(QueryStage::FlatJoin, e))?;
                let nested = aggregate(rows)?;
                if nested.len() as u64 > limit {
                    tracing::warn!(
                        members = nested.len(),
                        limit,
                        "unpaged flat join result capped"
                    );
                }
                paginate(nested, 0, limit)
                    .into_iter()
                    .map(MemberOrders::from)
                    .collect()
            }
        };

        Ok(nested)
    }

    /// One page of members with their orders.
    pub async fn search_page(
        &self,
        condition: &SearchCondition,
        page: &PageSpec,
    ) -> QueryResult<PageResult<MemberOrders>> {
        let (members, total, page) = self.member_page(condition, page).await?;
        let content = self.attach_orders(members).await?;
        Ok(PageResult::new(content, total, &page))
    }

    /// One page of members with their teams, without orders.
    pub async fn search_members_page(
        &self,
        condition: &SearchCondition,
        page: &PageSpec,
    ) -> QueryResult<PageResult<MemberTeamRow>> {
        let (members, total, page) = self.member_page(condition, page).await?;
        Ok(PageResult::new(members, total, &page))
    }

    async fn member_page(
        &self,
        condition: &SearchCondition,
        page: &PageSpec,
    ) -> QueryResult<(Vec<MemberTeamRow>, u64, PageSpec)> {
        let page = self.cap_page(page);
        let predicate = compose(condition);

        let members = self.executor.fetch_page(&predicate, &page).await?;
        let total = self.resolve_total(&predicate, &page, members.len()).await?;

        Ok((members, total, page))
    }

    async fn resolve_total(
        &self,
        predicate: &Predicate,
        page: &PageSpec,
        content_len: usize,
    ) -> QueryResult<u64> {
        resolve_total(self.options.count_strategy, page, content_len, || {
            self.executor.count(predicate)
        })
        .await
    }

    async fn attach_orders(&self, members: Vec<MemberTeamRow>) -> QueryResult<Vec<MemberOrders>> {
        let store = &self.store;
        let nested = self
            .loader
            .load(
                members,
                |m: &MemberTeamRow| m.member_id,
                |o: &OrderRow| o.member_id,
                |ids: Vec<i64>| async move {
                    store
                        .fetch_orders(&ids)
                        .await
                        .map_err(|e| QueryError::execution(QueryStage::BatchLookup, e))
                },
            )
            .await?;

        Ok(nested.into_iter().map(MemberOrders::from).collect())
    }

    fn cap_page(&self, page: &PageSpec) -> PageSpec {
        let max = self.options.max_page_size;
        if page.size() > max {
            tracing::warn!(requested = page.size(), max, "page size capped");
        }
        page.capped(max)
    }
}
