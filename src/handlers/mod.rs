//! HTTP read API.

pub mod orders;

pub use orders::{router, serve, with_assets, ErrorResponse};
