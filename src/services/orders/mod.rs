//! Order orchestration.
//!
//! `OrderService` is the single point where business rules are enforced and
//! where the cache and the store meet. Lookups read through the cache;
//! ingestion validates and writes to the store only.

use std::sync::Arc;

use chrono::SubsecRound;
use tracing::{debug, info, warn};

use crate::cache::OrderCache;
use crate::model::Order;
use crate::storage::{OrderStore, StorageError};
use crate::validation::{self, ValidationError};

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors returned by the order service.
///
/// Store errors pass through unchanged; only identifier and order
/// validation failures originate here.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("invalid order identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("validation failed: {0}")]
    Validation(ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Caller-facing classification of a `ServiceError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidIdentifier,
    ValidationFailed,
    NotFound,
    DuplicateIdentifier,
    DuplicateTrackNumber,
    DuplicateTransaction,
    Integrity,
    Internal,
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::InvalidIdentifier(_) => ErrorKind::InvalidIdentifier,
            ServiceError::Validation(_) => ErrorKind::ValidationFailed,
            ServiceError::Storage(err) => match err {
                StorageError::NotFound(_) => ErrorKind::NotFound,
                StorageError::DuplicateOrderUid(_) => ErrorKind::DuplicateIdentifier,
                StorageError::DuplicateTrackNumber(_) => ErrorKind::DuplicateTrackNumber,
                StorageError::DuplicateTransaction(_) => ErrorKind::DuplicateTransaction,
                StorageError::Integrity { .. } => ErrorKind::Integrity,
                StorageError::Database(_) => ErrorKind::Internal,
            },
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidIdentifier(raw) => ServiceError::InvalidIdentifier(raw),
            other => ServiceError::Validation(other),
        }
    }
}

/// Fractional-second digits kept by the store for `date_created`.
const STORED_SUBSEC_DIGITS: u16 = 6;

/// Mediates between the read-through cache and the transactional store.
///
/// Constructed once at startup and shared by the HTTP layer and the
/// stream consumer.
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    cache: Arc<dyn OrderCache>,
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>, cache: Arc<dyn OrderCache>) -> Self {
        Self { store, cache }
    }

    /// Look up an order by its textual UID.
    ///
    /// A malformed identifier never reaches the store. On a cache miss the
    /// store result is written back into the cache before returning.
    pub async fn lookup(&self, order_uid: &str) -> Result<Order> {
        let uid = validation::parse_order_uid(order_uid)?;

        if let Some(order) = self.cache.get(&uid) {
            debug!(order_uid = %uid, "Cache hit");
            return Ok(order);
        }

        let order = self.store.get_order(uid).await?;
        self.cache.set(order.clone());
        debug!(order_uid = %uid, "Cache filled from store");
        Ok(order)
    }

    /// Validate and persist an order.
    ///
    /// Returns the stored order with surrogate ids assigned and
    /// `date_created` truncated to microseconds, the precision the store
    /// keeps. The cache is not touched; a new order becomes visible to fast
    /// reads after its first lookup or the next warm-up.
    pub async fn ingest(&self, mut order: Order) -> Result<Order> {
        validation::validate_order(&order)?;
        order.date_created = order.date_created.trunc_subsecs(STORED_SUBSEC_DIGITS);

        let stored = self.store.insert_order(order).await?;
        info!(
            order_uid = %stored.order_uid,
            track_number = %stored.track_number,
            items = stored.items.len(),
            "Order ingested"
        );
        Ok(stored)
    }

    /// Load every persisted order into the cache. Returns the number loaded.
    pub async fn warm_cache(&self) -> Result<usize> {
        let orders = self.store.list_orders().await.map_err(|e| {
            warn!(error = %e, "Failed to load orders for cache warm-up");
            ServiceError::from(e)
        })?;

        let count = orders.len();
        self.cache.set_all(orders);
        info!(count, cached = self.cache.len(), "Cache warmed");
        Ok(count)
    }
}

#[cfg(test)]
mod tests;
