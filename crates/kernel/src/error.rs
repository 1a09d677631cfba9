//! Query error types.

use std::fmt;

use thiserror::Error;

/// Stage of a request at which a storage call was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStage {
    /// The page (or unpaged) content query.
    Content,
    /// The total-count query.
    Count,
    /// A batched child lookup.
    BatchLookup,
    /// The parent × child flat join.
    FlatJoin,
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryStage::Content => "content",
            QueryStage::Count => "count",
            QueryStage::BatchLookup => "batch lookup",
            QueryStage::FlatJoin => "flat join",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by the query layer.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid page spec: {0}")]
    InvalidPageSpec(String),

    #[error("invalid sort key: {0}")]
    InvalidSortKey(String),

    #[error("{stage} query failed")]
    QueryExecutionFailed {
        stage: QueryStage,
        #[source]
        source: anyhow::Error,
    },

    #[error("aggregation invariant violated: {0}")]
    AggregationInvariantViolation(String),
}

impl QueryError {
    /// Wrap a storage failure for the given stage.
    pub fn execution(stage: QueryStage, source: anyhow::Error) -> Self {
        tracing::error!(%stage, error = %source, "storage query failed");
        QueryError::QueryExecutionFailed { stage, source }
    }

    /// The stage that failed, if this is an execution failure.
    pub fn stage(&self) -> Option<QueryStage> {
        match self {
            QueryError::QueryExecutionFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Result type alias using QueryError.
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_error_reports_stage() {
        let err = QueryError::execution(QueryStage::Count, anyhow::anyhow!("connection reset"));
        assert_eq!(err.stage(), Some(QueryStage::Count));
        assert_eq!(err.to_string(), "count query failed");
    }

    #[test]
    fn page_spec_error_has_no_stage() {
        let err = QueryError::InvalidPageSpec("size must be positive".to_string());
        assert_eq!(err.stage(), None);
        assert!(err.to_string().contains("size must be positive"));
    }
}
