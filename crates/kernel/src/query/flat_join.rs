//! Flat-join aggregation.
//!
//! A parent × child outer join returns one row per (parent, child) pair with
//! the parent columns repeated. [`aggregate`] folds those rows back into one
//! [`Nested`] record per parent key. Because the join multiplies rows, paging
//! can only happen afterwards, on the aggregated list ([`paginate`]).

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use super::types::Nested;
use crate::error::{QueryError, QueryResult};

/// A row of a parent × child outer join.
pub trait FlatRow {
    /// Unique parent identifier used for grouping.
    type Key: Eq + Hash + Copy + Debug;
    type Parent: PartialEq;
    type Child;

    fn parent_key(&self) -> Self::Key;

    /// Parent columns of this row.
    fn parent(&self) -> Self::Parent;

    /// Child columns of this row, or `None` when the outer join found no child.
    fn into_child(self) -> Option<Self::Child>;
}

/// Group flat rows by parent key.
///
/// Parents keep the order of their first row. Rows without a child contribute
/// nothing to the child list, so a childless parent appears exactly once with
/// no children. Two rows with the same key but different parent columns are
/// rejected.
pub fn aggregate<R: FlatRow>(rows: Vec<R>) -> QueryResult<Vec<Nested<R::Parent, R::Child>>> {
    let mut nested: Vec<Nested<R::Parent, R::Child>> = Vec::new();
    let mut index: HashMap<R::Key, usize> = HashMap::new();
    let row_count = rows.len();

    for row in rows {
        let key = row.parent_key();
        let position = match index.get(&key) {
            Some(&position) => {
                if nested[position].parent != row.parent() {
                    return Err(QueryError::AggregationInvariantViolation(format!(
                        "rows for parent {key:?} disagree on parent columns"
                    )));
                }
                position
            }
            None => {
                index.insert(key, nested.len());
                nested.push(Nested::new(row.parent(), Vec::new()));
                nested.len() - 1
            }
        };

        if let Some(child) = row.into_child() {
            nested[position].children.push(child);
        }
    }

    tracing::debug!(rows = row_count, parents = nested.len(), "flat join aggregated");
    Ok(nested)
}

/// Apply offset/limit to an aggregated parent list.
pub fn paginate<T>(items: Vec<T>, offset: u64, limit: u64) -> Vec<T> {
    let offset = usize::try_from(offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    items.into_iter().skip(offset).take(limit).collect()
}
