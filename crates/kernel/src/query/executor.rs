//! Content query execution against a [`QueryStore`].

use std::sync::Arc;

use super::predicate::Predicate;
use super::types::{PageSpec, SortField, SortKey};
use crate::error::{QueryError, QueryResult, QueryStage};
use crate::models::MemberTeamRow;
use crate::store::QueryStore;

/// Runs filtered, sorted and bounded member queries.
#[derive(Clone)]
pub struct QueryExecutor {
    store: Arc<dyn QueryStore>,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn QueryStore>) -> Self {
        Self { store }
    }

    /// Rows for one page, in sort order.
    pub async fn fetch_page(
        &self,
        predicate: &Predicate,
        page: &PageSpec,
    ) -> QueryResult<Vec<MemberTeamRow>> {
        self.fetch(predicate, page.sort(), page.offset(), u64::from(page.size()))
            .await
    }

    /// Up to `limit` rows from the start of the result.
    pub async fn fetch_unpaged(
        &self,
        predicate: &Predicate,
        sorts: &[SortKey],
        limit: u64,
    ) -> QueryResult<Vec<MemberTeamRow>> {
        self.fetch(predicate, sorts, 0, limit).await
    }

    /// Total matching rows.
    pub async fn count(&self, predicate: &Predicate) -> QueryResult<u64> {
        self.store
            .count_members(predicate)
            .await
            .map_err(|e| QueryError::execution(QueryStage::Count, e))
    }

    async fn fetch(
        &self,
        predicate: &Predicate,
        sorts: &[SortKey],
        offset: u64,
        limit: u64,
    ) -> QueryResult<Vec<MemberTeamRow>> {
        let sorts = with_tie_breaker(sorts);
        let mut rows = self
            .store
            .fetch_members(predicate, &sorts, offset, limit)
            .await
            .map_err(|e| QueryError::execution(QueryStage::Content, e))?;

        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        if rows.len() > limit {
            tracing::warn!(
                returned = rows.len(),
                limit,
                "store returned more rows than requested, truncating"
            );
            rows.truncate(limit);
        }

        Ok(rows)
    }
}

/// Sort keys with `member_id ASC` appended unless already present, so that
/// rows with equal sort values come back in the same order on every call.
pub fn with_tie_breaker(sorts: &[SortKey]) -> Vec<SortKey> {
    let mut sorts = sorts.to_vec();
    if !sorts.iter().any(|s| s.field == SortField::MemberId) {
        sorts.push(SortKey::asc(SortField::MemberId));
    }
    sorts
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreCall};

    fn member(id: i64, username: &str, age: i32) -> MemberTeamRow {
        MemberTeamRow {
            member_id: id,
            username: username.to_string(),
            age,
            team_id: None,
            team_name: None,
        }
    }

    #[test]
    fn tie_breaker_is_appended_once() {
        let sorts = with_tie_breaker(&[SortKey::desc(SortField::Age)]);
        assert_eq!(
            sorts,
            vec![SortKey::desc(SortField::Age), SortKey::asc(SortField::MemberId)]
        );

        let sorts = with_tie_breaker(&[SortKey::desc(SortField::MemberId)]);
        assert_eq!(sorts, vec![SortKey::desc(SortField::MemberId)]);
    }

    #[tokio::test]
    async fn equal_sort_values_are_ordered_by_id() {
        let store = Arc::new(MemoryStore::new(
            vec![member(3, "c", 30), member(1, "a", 30), member(2, "b", 30)],
            vec![],
        ));
        let executor = QueryExecutor::new(store);
        let page = PageSpec::new(0, 10, vec![SortKey::asc(SortField::Age)]).unwrap();

        let rows = executor.fetch_page(&Predicate::MatchAll, &page).await.unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.member_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn passes_page_bounds_to_store() {
        let store = Arc::new(MemoryStore::new(vec![member(1, "a", 20)], vec![]));
        let executor = QueryExecutor::new(store.clone());
        let page = PageSpec::new(4, 2, vec![]).unwrap();

        let rows = executor.fetch_page(&Predicate::MatchAll, &page).await.unwrap();
        assert!(rows.is_empty());
        assert_eq!(
            store.calls(),
            vec![StoreCall::FetchMembers { offset: 4, limit: 2 }]
        );
    }

    #[tokio::test]
    async fn store_failure_becomes_content_error() {
        let store = Arc::new(MemoryStore::default().failing_on(QueryStage::Content));
        let executor = QueryExecutor::new(store);

        let err = executor
            .fetch_unpaged(&Predicate::MatchAll, &[], 10)
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(QueryStage::Content));
    }
}
