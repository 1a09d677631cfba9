//! Member query layer.
//!
//! This module provides:
//! - predicate: optional filters composed into one predicate tree
//! - query_builder: SeaQuery-based SQL generation
//! - executor: content queries against a store
//! - pager: total resolution with count-query elision
//! - batch_loader: batched one-to-many loading
//! - flat_join: outer-join row aggregation
//! - service: MemberSearchService, the entry point for callers

pub mod batch_loader;
pub mod executor;
pub mod flat_join;
pub mod pager;
pub mod predicate;
pub mod query_builder;
pub mod service;
pub mod types;

pub use batch_loader::BatchLoader;
pub use executor::QueryExecutor;
pub use flat_join::{FlatRow, aggregate, paginate};
pub use pager::CountStrategy;
pub use predicate::{FilterField, FilterOperator, FilterValue, Predicate, compose};
pub use query_builder::MemberQueryBuilder;
pub use service::{ChildStrategy, MemberSearchService, SearchOptions};
pub use types::{
    Nested, PageResult, PageSpec, SearchCondition, SortDirection, SortField, SortKey,
};
