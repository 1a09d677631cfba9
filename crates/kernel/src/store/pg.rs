//! PostgreSQL store.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::QueryStore;
use crate::models::{MemberOrderFlatRow, MemberTeamRow, OrderRow};
use crate::query::predicate::Predicate;
use crate::query::query_builder::{MemberQueryBuilder, build_orders_batch};
use crate::query::types::SortKey;

/// Store backed by a PostgreSQL pool.
///
/// Every call runs in its own short transaction so `SET LOCAL
/// statement_timeout` applies to that call only.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    statement_timeout: Duration,
}

impl PgStore {
    pub fn new(pool: PgPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin transaction")?;

        let timeout_sql = format!(
            "SET LOCAL statement_timeout = '{}ms'",
            self.statement_timeout.as_millis()
        );
        sqlx::query(&timeout_sql)
            .execute(&mut *tx)
            .await
            .context("failed to set statement timeout")?;

        Ok(tx)
    }
}

#[async_trait]
impl QueryStore for PgStore {
    async fn fetch_members(
        &self,
        predicate: &Predicate,
        sorts: &[SortKey],
        offset: u64,
        limit: u64,
    ) -> Result<Vec<MemberTeamRow>> {
        let sql = MemberQueryBuilder::new(predicate).build_page(sorts, offset, limit);
        tracing::debug!(%sql, "member page query");

        let mut tx = self.begin().await?;
        let rows = sqlx::query_as::<_, MemberTeamRow>(&sql)
            .fetch_all(&mut *tx)
            .await
            .context("failed to execute member page query")?;
        tx.commit()
            .await
            .context("failed to commit query transaction")?;

        Ok(rows)
    }

    async fn count_members(&self, predicate: &Predicate) -> Result<u64> {
        let sql = MemberQueryBuilder::new(predicate).build_count();
        tracing::debug!(%sql, "member count query");

        let mut tx = self.begin().await?;
        let total: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&mut *tx)
            .await
            .context("failed to execute member count query")?;
        tx.commit()
            .await
            .context("failed to commit query transaction")?;

        Ok(total.max(0) as u64)
    }

    async fn fetch_orders(&self, member_ids: &[i64]) -> Result<Vec<OrderRow>> {
        if member_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = build_orders_batch(member_ids);
        tracing::debug!(ids = member_ids.len(), "order batch query");

        let mut tx = self.begin().await?;
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .fetch_all(&mut *tx)
            .await
            .context("failed to execute order batch query")?;
        tx.commit()
            .await
            .context("failed to commit query transaction")?;

        Ok(rows)
    }

    async fn fetch_member_orders_flat(
        &self,
        predicate: &Predicate,
        sorts: &[SortKey],
    ) -> Result<Vec<MemberOrderFlatRow>> {
        let sql = MemberQueryBuilder::new(predicate).build_flat(sorts);
        tracing::debug!(%sql, "member/order flat join query");

        let mut tx = self.begin().await?;
        let rows = sqlx::query_as::<_, MemberOrderFlatRow>(&sql)
            .fetch_all(&mut *tx)
            .await
            .context("failed to execute member/order flat join query")?;
        tx.commit()
            .await
            .context("failed to commit query transaction")?;

        Ok(rows)
    }
}
