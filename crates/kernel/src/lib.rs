//! pagewise kernel library
//!
//! Optional-filter member search with count-elided pagination and two
//! strategies for loading member orders (batched lookup, flat join).
//! The `pagewise` binary wires it to PostgreSQL.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod store;
