//! Order persistence.
//!
//! This module contains:
//! - `OrderStore` trait: transactional persistence of the order graph
//! - `StorageError`: typed failure causes
//! - Implementations: PostgreSQL (feature `postgres`), Mock

use async_trait::async_trait;
use uuid::Uuid;

use crate::model::Order;

// Implementation modules
pub mod mock;
#[cfg(feature = "postgres")]
pub mod postgres;

// Re-exports
pub use mock::MockOrderStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresOrderStore;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
///
/// Every failure aborts the enclosing transaction.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("order not found: {0}")]
    NotFound(Uuid),

    #[error("order with uid {0} already exists")]
    DuplicateOrderUid(Uuid),

    #[error("order with track number '{0}' already exists")]
    DuplicateTrackNumber(String),

    #[error("payment with transaction {0} already exists")]
    DuplicateTransaction(Uuid),

    /// The order row exists but a row it owns is missing.
    #[error("order {order_uid} is missing its {relation}")]
    Integrity { order_uid: Uuid, relation: String },

    #[error("database error: {0}")]
    Database(String),
}

impl StorageError {
    /// Whether the error is a uniqueness conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StorageError::DuplicateOrderUid(_)
                | StorageError::DuplicateTrackNumber(_)
                | StorageError::DuplicateTransaction(_)
        )
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

/// Interface for order persistence.
///
/// Each call opens and closes its own transaction; transactions are never
/// shared between logical operations.
///
/// Implementations:
/// - `PostgresOrderStore`: PostgreSQL storage
/// - `MockOrderStore`: In-memory mock for testing
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert delivery, payment, order and items atomically.
    ///
    /// Returns the order with its delivery and payment surrogate ids filled in.
    /// Duplicate UID, track number or payment transaction map to the
    /// corresponding `Duplicate*` error; nothing is written in that case.
    async fn insert_order(&self, order: Order) -> Result<Order>;

    /// Read one order with everything it owns.
    ///
    /// `NotFound` when the order row is absent; `Integrity` when the order row
    /// exists but its delivery or payment row does not.
    async fn get_order(&self, order_uid: Uuid) -> Result<Order>;

    /// Read every order with everything it owns. Used at startup.
    async fn list_orders(&self) -> Result<Vec<Order>>;
}
