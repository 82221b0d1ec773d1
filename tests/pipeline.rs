//! End-to-end pipeline tests: stream -> consumer -> service -> store -> cache.
//!
//! Uses the in-memory source and store, so no external services are needed.

use std::sync::Arc;

use orderstream::bus::{MockOrderSource, OrderConsumer};
use orderstream::cache::{InMemoryOrderCache, OrderCache};
use orderstream::services::{ErrorKind, OrderService};
use orderstream::storage::MockOrderStore;
use orderstream::test_utils::{sample_order, unique_track};
use tokio_util::sync::CancellationToken;

struct Pipeline {
    source: Arc<MockOrderSource>,
    store: Arc<MockOrderStore>,
    cache: Arc<InMemoryOrderCache>,
    service: Arc<OrderService>,
}

fn pipeline() -> Pipeline {
    let source = Arc::new(MockOrderSource::new());
    let store = Arc::new(MockOrderStore::new());
    let cache = Arc::new(InMemoryOrderCache::new());
    let service = Arc::new(OrderService::new(store.clone(), cache.clone()));
    Pipeline {
        source,
        store,
        cache,
        service,
    }
}

impl Pipeline {
    async fn drain(&self) -> orderstream::bus::ConsumerStats {
        self.source.close().await;
        OrderConsumer::new(self.source.clone(), self.service.clone())
            .run(CancellationToken::new())
            .await
    }
}

#[tokio::test]
async fn test_invalid_json_does_not_block_next_order() {
    let p = pipeline();
    let order = sample_order(&unique_track(), 2);
    p.source.push(r#"{"order_uid": "#).await;
    p.source.push_json(&order).await;

    let stats = p.drain().await;

    assert_eq!(stats.persisted, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(p.source.committed_offsets().await, vec![0, 1]);

    let fetched = p.service.lookup(&order.order_uid.to_string()).await.unwrap();
    assert_eq!(fetched.without_surrogate_ids(), order);
}

#[tokio::test]
async fn test_three_item_order_round_trips_exactly() {
    let p = pipeline();
    let order = sample_order(&unique_track(), 3);
    p.source.push_json(&order).await;

    p.drain().await;

    assert!(p.cache.is_empty(), "ingest does not warm the cache");
    let fetched = p.service.lookup(&order.order_uid.to_string()).await.unwrap();
    assert_eq!(fetched.items.len(), 3);
    assert_eq!(fetched.payment.amount, 1817);
    assert!(fetched.items.iter().all(|i| i.sale == 0));
    assert_eq!(p.store.get_calls(), 1);
    assert_eq!(p.cache.len(), 1);
}

#[tokio::test]
async fn test_replayed_message_is_rejected_but_acknowledged() {
    let p = pipeline();
    let order = sample_order(&unique_track(), 1);
    p.source.push_json(&order).await;
    p.source.push_json(&order).await;

    let stats = p.drain().await;

    assert_eq!(stats.persisted, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(p.source.committed_offsets().await, vec![0, 1]);
    assert_eq!(p.store.stored_count().await, 1);

    let err = p.service.ingest(order).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateIdentifier);
}

#[tokio::test]
async fn test_warm_cache_after_ingest_serves_without_store() {
    let p = pipeline();
    let orders: Vec<_> = (0..4).map(|_| sample_order(&unique_track(), 1)).collect();
    for order in &orders {
        p.source.push_json(order).await;
    }
    p.drain().await;

    assert_eq!(p.service.warm_cache().await.unwrap(), orders.len());
    for order in &orders {
        p.service
            .lookup(&order.order_uid.to_string())
            .await
            .unwrap();
    }
    assert_eq!(p.store.get_calls(), 0);
}
