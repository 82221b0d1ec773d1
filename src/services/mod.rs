//! Application services.

pub mod orders;

pub use orders::{ErrorKind, OrderService, ServiceError};
