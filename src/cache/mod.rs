//! In-memory order cache.
//!
//! The `OrderCache` trait is the contract callers depend on; the retention
//! policy lives entirely in the implementation. `InMemoryOrderCache` keeps
//! every entry for the life of the process (no eviction, no TTL), which is
//! only acceptable for small data sets. A bounded implementation can be
//! dropped in behind the same trait.

use std::collections::HashMap;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::model::Order;

/// Concurrent key → order mapping.
///
/// Readers never block each other. A `get` racing a `set` on the same key
/// observes either the old or the new value, never a partial one.
pub trait OrderCache: Send + Sync {
    /// Look up an order. Absence is not an error.
    fn get(&self, order_uid: &Uuid) -> Option<Order>;

    /// Insert or replace one entry. Last writer wins.
    fn set(&self, order: Order);

    /// Bulk-load entries. Each entry becomes visible as it is inserted;
    /// the batch as a whole is not atomic with respect to readers.
    fn set_all(&self, orders: Vec<Order>);

    /// Number of cached orders.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unbounded cache backed by a single reader/writer lock.
#[derive(Default)]
pub struct InMemoryOrderCache {
    orders: RwLock<HashMap<Uuid, Order>>,
}

impl InMemoryOrderCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderCache for InMemoryOrderCache {
    fn get(&self, order_uid: &Uuid) -> Option<Order> {
        self.orders.read().get(order_uid).cloned()
    }

    fn set(&self, order: Order) {
        // Keyed by the order's own UID.
        self.orders.write().insert(order.order_uid, order);
    }

    fn set_all(&self, orders: Vec<Order>) {
        for order in orders {
            self.set(order);
        }
    }

    fn len(&self) -> usize {
        self.orders.read().len()
    }
}
