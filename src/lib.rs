//! Orderstream - order ingestion and lookup service
//!
//! Consumes JSON-encoded orders from a Kafka topic, persists each order
//! graph transactionally in PostgreSQL, and serves lookups over HTTP from a
//! read-through in-memory cache.

pub mod bus;
pub mod cache;
pub mod config;
pub mod handlers;
pub mod model;
pub mod services;
pub mod storage;
pub mod utils;
pub mod validation;

#[doc(hidden)]
pub mod test_utils;
