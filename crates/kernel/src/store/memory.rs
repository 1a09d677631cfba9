//! In-memory store with a call log.
//!
//! Evaluates predicates with the same semantics as the SQL the PostgreSQL
//! store generates (NULL team names never match, NULLs sort last ascending and
//! first descending) and records every call so callers can assert on query
//! counts.

use std::cmp::Ordering;
use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;

use super::QueryStore;
use crate::error::QueryStage;
use crate::models::{MemberOrderFlatRow, MemberTeamRow, OrderRow};
use crate::query::predicate::Predicate;
use crate::query::types::{SortDirection, SortField, SortKey};

/// A call made against a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    FetchMembers { offset: u64, limit: u64 },
    CountMembers,
    FetchOrders { member_ids: Vec<i64> },
    FetchMemberOrdersFlat,
}

impl StoreCall {
    /// Query stage this call belongs to.
    pub fn stage(&self) -> QueryStage {
        match self {
            StoreCall::FetchMembers { .. } => QueryStage::Content,
            StoreCall::CountMembers => QueryStage::Count,
            StoreCall::FetchOrders { .. } => QueryStage::BatchLookup,
            StoreCall::FetchMemberOrdersFlat => QueryStage::FlatJoin,
        }
    }
}

/// Store holding members (already joined with their teams) and orders.
#[derive(Default)]
pub struct MemoryStore {
    members: Vec<MemberTeamRow>,
    orders: Vec<OrderRow>,
    fail_on: Option<QueryStage>,
    calls: Mutex<Vec<StoreCall>>,
}

impl MemoryStore {
    pub fn new(members: Vec<MemberTeamRow>, orders: Vec<OrderRow>) -> Self {
        Self {
            members,
            orders,
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Make every call of the given stage fail (after being logged).
    pub fn failing_on(mut self, stage: QueryStage) -> Self {
        self.fail_on = Some(stage);
        self
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    /// Number of calls made for `stage`.
    pub fn calls_for(&self, stage: QueryStage) -> usize {
        self.calls.lock().iter().filter(|c| c.stage() == stage).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: StoreCall) -> Result<()> {
        let stage = call.stage();
        self.calls.lock().push(call);
        if self.fail_on == Some(stage) {
            anyhow::bail!("injected {stage} failure");
        }
        Ok(())
    }

    fn matching_members(&self, predicate: &Predicate, sorts: &[SortKey]) -> Vec<&MemberTeamRow> {
        let mut rows: Vec<&MemberTeamRow> = self
            .members
            .iter()
            .filter(|row| predicate.matches(row))
            .collect();
        rows.sort_by(|a, b| compare_rows(a, b, sorts));
        rows
    }

    fn orders_of(&self, member_id: i64) -> Vec<&OrderRow> {
        let mut orders: Vec<&OrderRow> = self
            .orders
            .iter()
            .filter(|o| o.member_id == member_id)
            .collect();
        orders.sort_by_key(|o| o.order_id);
        orders
    }
}

fn compare_rows(a: &MemberTeamRow, b: &MemberTeamRow, sorts: &[SortKey]) -> Ordering {
    for sort in sorts {
        let ord = match sort.field {
            SortField::MemberId => a.member_id.cmp(&b.member_id),
            SortField::Username => a.username.cmp(&b.username),
            SortField::Age => a.age.cmp(&b.age),
            SortField::TeamName => nulls_last(a.team_name.as_deref(), b.team_name.as_deref()),
        };
        let ord = match sort.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// PostgreSQL ordering: NULL compares greater than any value.
fn nulls_last(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a.cmp(b),
    }
}

#[async_trait]
impl QueryStore for MemoryStore {
    async fn fetch_members(
        &self,
        predicate: &Predicate,
        sorts: &[SortKey],
        offset: u64,
        limit: u64,
    ) -> Result<Vec<MemberTeamRow>> {
        self.record(StoreCall::FetchMembers { offset, limit })?;

        Ok(self
            .matching_members(predicate, sorts)
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn count_members(&self, predicate: &Predicate) -> Result<u64> {
        self.record(StoreCall::CountMembers)?;

        Ok(self.members.iter().filter(|row| predicate.matches(row)).count() as u64)
    }

    async fn fetch_orders(&self, member_ids: &[i64]) -> Result<Vec<OrderRow>> {
        self.record(StoreCall::FetchOrders {
            member_ids: member_ids.to_vec(),
        })?;

        let wanted: HashSet<i64> = member_ids.iter().copied().collect();
        let mut orders: Vec<OrderRow> = self
            .orders
            .iter()
            .filter(|o| wanted.contains(&o.member_id))
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.order_id);
        Ok(orders)
    }

    async fn fetch_member_orders_flat(
        &self,
        predicate: &Predicate,
        sorts: &[SortKey],
    ) -> Result<Vec<MemberOrderFlatRow>> {
        self.record(StoreCall::FetchMemberOrdersFlat)?;

        let mut rows = Vec::new();
        for member in self.matching_members(predicate, sorts) {
            let orders = self.orders_of(member.member_id);
            if orders.is_empty() {
                rows.push(flat_row(member, None));
            }
            for order in orders {
                rows.push(flat_row(member, Some(order)));
            }
        }
        Ok(rows)
    }
}

fn flat_row(member: &MemberTeamRow, order: Option<&OrderRow>) -> MemberOrderFlatRow {
    MemberOrderFlatRow {
        member_id: member.member_id,
        username: member.username.clone(),
        age: member.age,
        team_id: member.team_id,
        team_name: member.team_name.clone(),
        order_id: order.map(|o| o.order_id),
        item_name: order.and_then(|o| o.item_name.clone()),
        order_price: order.map(|o| o.order_price),
        count: order.map(|o| o.count),
        ordered_at: order.map(|o| o.ordered_at),
    }
}
