//! Storage collaborators for the query layer.
//!
//! The query layer talks to storage only through [`QueryStore`]:
//! - [`PgStore`]: PostgreSQL via sqlx, SQL generated by SeaQuery
//! - [`MemoryStore`]: in-process tables with a call log, used by tests and demos

mod memory;
mod pg;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{MemberOrderFlatRow, MemberTeamRow, OrderRow};
use crate::query::predicate::Predicate;
use crate::query::types::SortKey;

pub use memory::{MemoryStore, StoreCall};
pub use pg::PgStore;

/// Storage operations consumed by the query layer.
///
/// Implementations are black boxes: they evaluate the predicate, apply the
/// sort and bounds exactly as given, and report failures as errors.
#[async_trait]
pub trait QueryStore: Send + Sync {
    /// Member/team rows matching `predicate`, ordered by `sorts`, skipping
    /// `offset` rows and returning at most `limit`.
    async fn fetch_members(
        &self,
        predicate: &Predicate,
        sorts: &[SortKey],
        offset: u64,
        limit: u64,
    ) -> Result<Vec<MemberTeamRow>>;

    /// Number of members matching `predicate`.
    async fn count_members(&self, predicate: &Predicate) -> Result<u64>;

    /// All orders whose `member_id` is in `member_ids`, by `order_id` ascending.
    async fn fetch_orders(&self, member_ids: &[i64]) -> Result<Vec<OrderRow>>;

    /// One row per (member, order) pair, with one order-less row for members
    /// without orders. Ordered by `sorts`, then `order_id`.
    async fn fetch_member_orders_flat(
        &self,
        predicate: &Predicate,
        sorts: &[SortKey],
    ) -> Result<Vec<MemberOrderFlatRow>>;
}
