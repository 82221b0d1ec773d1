//! Mock storage implementation for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{OrderStore, Result, StorageError};
use crate::model::Order;

/// Mock order store that keeps orders in memory.
///
/// Enforces the same uniqueness rules as the relational schema and records
/// how many times each operation was called.
#[derive(Default)]
pub struct MockOrderStore {
    orders: RwLock<HashMap<Uuid, Order>>,
    broken: RwLock<HashMap<Uuid, String>>,
    next_id: AtomicI32,
    insert_calls: AtomicUsize,
    get_calls: AtomicUsize,
    list_calls: AtomicUsize,
    fail_on_insert: RwLock<bool>,
    fail_on_get: RwLock<bool>,
    fail_on_list: RwLock<bool>,
}

impl MockOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_insert(&self, fail: bool) {
        *self.fail_on_insert.write().await = fail;
    }

    pub async fn set_fail_on_get(&self, fail: bool) {
        *self.fail_on_get.write().await = fail;
    }

    pub async fn set_fail_on_list(&self, fail: bool) {
        *self.fail_on_list.write().await = fail;
    }

    /// Make reads of `order_uid` report a missing owned row.
    pub async fn break_relation(&self, order_uid: Uuid, relation: &str) {
        self.broken
            .write()
            .await
            .insert(order_uid, relation.to_string());
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Total number of calls across all operations.
    pub fn total_calls(&self) -> usize {
        self.insert_calls() + self.get_calls() + self.list_calls()
    }

    pub async fn stored_count(&self) -> usize {
        self.orders.read().await.len()
    }

    fn assign_id(&self) -> i32 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn check_broken(&self, order_uid: Uuid) -> Result<()> {
        match self.broken.read().await.get(&order_uid) {
            Some(relation) => Err(StorageError::Integrity {
                order_uid,
                relation: relation.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl OrderStore for MockOrderStore {
    async fn insert_order(&self, mut order: Order) -> Result<Order> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_on_insert.read().await {
            return Err(StorageError::Database("mock insert failure".to_string()));
        }

        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.order_uid) {
            return Err(StorageError::DuplicateOrderUid(order.order_uid));
        }
        if orders
            .values()
            .any(|o| o.track_number == order.track_number)
        {
            return Err(StorageError::DuplicateTrackNumber(order.track_number));
        }
        if orders
            .values()
            .any(|o| o.payment.transaction == order.payment.transaction)
        {
            return Err(StorageError::DuplicateTransaction(order.payment.transaction));
        }

        order.delivery.id = self.assign_id();
        order.payment.id = self.assign_id();
        orders.insert(order.order_uid, order.clone());
        Ok(order)
    }

    async fn get_order(&self, order_uid: Uuid) -> Result<Order> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_on_get.read().await {
            return Err(StorageError::Database("mock get failure".to_string()));
        }

        let order = self
            .orders
            .read()
            .await
            .get(&order_uid)
            .cloned()
            .ok_or(StorageError::NotFound(order_uid))?;
        self.check_broken(order_uid).await?;
        Ok(order)
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_on_list.read().await {
            return Err(StorageError::Database("mock list failure".to_string()));
        }

        let orders: Vec<Order> = self.orders.read().await.values().cloned().collect();
        for order in &orders {
            self.check_broken(order.order_uid).await?;
        }
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_order;

    #[tokio::test]
    async fn test_insert_assigns_surrogate_ids() {
        let store = MockOrderStore::new();
        let stored = store.insert_order(sample_order("T-1", 2)).await.unwrap();

        assert_ne!(stored.delivery.id, 0);
        assert_ne!(stored.payment.id, 0);
        assert_ne!(stored.delivery.id, stored.payment.id);
        assert_eq!(store.insert_calls(), 1);
    }

    #[tokio::test]
    async fn test_get_round_trip() {
        let store = MockOrderStore::new();
        let stored = store.insert_order(sample_order("T-1", 2)).await.unwrap();

        let fetched = store.get_order(stored.order_uid).await.unwrap();
        assert_eq!(fetched, stored);
        assert_eq!(store.get_calls(), 1);
    }

    #[tokio::test]
    async fn test_uniqueness_rules() {
        let store = MockOrderStore::new();
        let first = store.insert_order(sample_order("T-1", 0)).await.unwrap();

        let err = store.insert_order(first.clone()).await.unwrap_err();
        assert!(matches!(err, StorageError::DuplicateOrderUid(uid) if uid == first.order_uid));

        let err = store.insert_order(sample_order("T-1", 0)).await.unwrap_err();
        assert!(matches!(err, StorageError::DuplicateTrackNumber(ref t) if t == "T-1"));

        let mut same_tx = sample_order("T-2", 0);
        same_tx.payment.transaction = first.payment.transaction;
        let err = store.insert_order(same_tx).await.unwrap_err();
        assert!(matches!(err, StorageError::DuplicateTransaction(_)));

        assert_eq!(store.stored_count().await, 1);
    }

    #[tokio::test]
    async fn test_not_found() {
        let store = MockOrderStore::new();
        let uid = Uuid::new_v4();
        let err = store.get_order(uid).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(u) if u == uid));
    }

    #[tokio::test]
    async fn test_broken_relation_reports_integrity() {
        let store = MockOrderStore::new();
        let stored = store.insert_order(sample_order("T-1", 0)).await.unwrap();
        store.break_relation(stored.order_uid, "payment").await;

        let err = store.get_order(stored.order_uid).await.unwrap_err();
        assert!(matches!(err, StorageError::Integrity { ref relation, .. } if relation == "payment"));
    }

    #[tokio::test]
    async fn test_failure_flags() {
        let store = MockOrderStore::new();
        store.set_fail_on_list(true).await;
        assert!(store.list_orders().await.is_err());
        assert_eq!(store.list_calls(), 1);
    }
}
