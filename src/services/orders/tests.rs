use super::*;
use crate::cache::InMemoryOrderCache;
use crate::storage::MockOrderStore;
use crate::test_utils::sample_order;
use uuid::Uuid;

fn create_service() -> (OrderService, Arc<MockOrderStore>, Arc<InMemoryOrderCache>) {
    let store = Arc::new(MockOrderStore::new());
    let cache = Arc::new(InMemoryOrderCache::new());
    let service = OrderService::new(store.clone(), cache.clone());
    (service, store, cache)
}

#[tokio::test]
async fn test_ingest_then_lookup_reads_store_and_fills_cache() {
    let (service, store, cache) = create_service();
    let order = sample_order("TRK-ROUND", 2);

    let stored = service.ingest(order.clone()).await.unwrap();
    assert!(cache.is_empty(), "ingest must not populate the cache");

    let fetched = service.lookup(&order.order_uid.to_string()).await.unwrap();
    assert_eq!(fetched, stored);
    assert_eq!(fetched.without_surrogate_ids(), order);
    assert_eq!(store.get_calls(), 1);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_ingest_truncates_date_created_to_microseconds() {
    let (service, _store, _cache) = create_service();
    let mut order = sample_order("TRK-NANOS", 1);
    order.date_created = "2021-11-26T06:22:19.123456789Z".parse().unwrap();

    let stored = service.ingest(order.clone()).await.unwrap();
    assert_eq!(
        stored.date_created,
        "2021-11-26T06:22:19.123456Z".parse::<chrono::DateTime<chrono::Utc>>().unwrap()
    );

    let fetched = service.lookup(&order.order_uid.to_string()).await.unwrap();
    assert_eq!(fetched, stored);
}

#[tokio::test]
async fn test_second_lookup_is_served_from_cache() {
    let (service, store, _cache) = create_service();
    let order = sample_order("TRK-IDEM", 1);
    service.ingest(order.clone()).await.unwrap();
    let uid = order.order_uid.to_string();

    let first = service.lookup(&uid).await.unwrap();
    let second = service.lookup(&uid).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(store.get_calls(), 1);
}

#[tokio::test]
async fn test_invalid_identifier_never_reaches_store() {
    let (service, store, _cache) = create_service();

    let err = service.lookup("not-a-uuid").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidIdentifier);
    assert!(matches!(err, ServiceError::InvalidIdentifier(ref raw) if raw == "not-a-uuid"));
    assert_eq!(store.total_calls(), 0);
}

#[tokio::test]
async fn test_unknown_uid_is_not_found() {
    let (service, _store, cache) = create_service();

    let err = service
        .lookup(&Uuid::new_v4().to_string())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_store_failure_on_lookup_is_internal() {
    let (service, store, cache) = create_service();
    store.set_fail_on_get(true).await;

    let err = service
        .lookup(&Uuid::new_v4().to_string())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_integrity_fault_is_propagated() {
    let (service, store, _cache) = create_service();
    let order = sample_order("TRK-BROKEN", 1);
    service.ingest(order.clone()).await.unwrap();
    store.break_relation(order.order_uid, "delivery").await;

    let err = service
        .lookup(&order.order_uid.to_string())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Integrity);
}

#[tokio::test]
async fn test_warm_cache_serves_lookups_without_store() {
    let (service, store, cache) = create_service();
    let mut uids = Vec::new();
    for i in 0..5 {
        let order = sample_order(&format!("TRK-WARM-{i}"), 1);
        uids.push(order.order_uid);
        service.ingest(order).await.unwrap();
    }

    let loaded = service.warm_cache().await.unwrap();
    assert_eq!(loaded, 5);
    assert_eq!(cache.len(), 5);

    for uid in &uids {
        let order = service.lookup(&uid.to_string()).await.unwrap();
        assert_eq!(order.order_uid, *uid);
    }
    assert_eq!(store.get_calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_lookups_on_warm_cache_return_own_order() {
    let (service, store, _cache) = create_service();
    let mut stored = Vec::new();
    for i in 0..16 {
        let order = sample_order(&format!("TRK-CONC-{i}"), i % 3);
        stored.push(service.ingest(order).await.unwrap());
    }
    service.warm_cache().await.unwrap();
    let service = Arc::new(service);

    let handles: Vec<_> = (0..8)
        .flat_map(|_| stored.iter().cloned())
        .map(|order| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                let fetched = service.lookup(&order.order_uid.to_string()).await.unwrap();
                fetched == order
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap());
    }
    assert_eq!(store.get_calls(), 0);
}

#[tokio::test]
async fn test_warm_cache_failure_leaves_cache_empty() {
    let (service, store, cache) = create_service();
    service.ingest(sample_order("TRK-1", 1)).await.unwrap();
    store.set_fail_on_list(true).await;

    let err = service.warm_cache().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_duplicate_uid_and_track_number() {
    let (service, _store, _cache) = create_service();
    let order = sample_order("TRK-DUP", 1);
    service.ingest(order.clone()).await.unwrap();

    let err = service.ingest(order.clone()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateIdentifier);

    let same_track = sample_order("TRK-DUP", 1);
    let err = service.ingest(same_track).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateTrackNumber);
}

#[tokio::test]
async fn test_invalid_order_never_reaches_store() {
    let (service, store, _cache) = create_service();
    let mut order = sample_order("TRK-BAD", 1);
    order.items[0].sale = 101;

    let err = service.ingest(order).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    match err {
        ServiceError::Validation(ValidationError::Field { field, .. }) => {
            assert_eq!(field, "items[0].sale");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(store.insert_calls(), 0);
}

#[tokio::test]
async fn test_three_items_zero_discount_amount_preserved() {
    let (service, _store, _cache) = create_service();
    let order = sample_order("TRK-1817", 3);
    assert!(order.items.iter().all(|i| i.sale == 0));

    service.ingest(order.clone()).await.unwrap();
    let fetched = service.lookup(&order.order_uid.to_string()).await.unwrap();

    assert_eq!(fetched.items.len(), 3);
    assert_eq!(fetched.payment.amount, 1817);
}

#[tokio::test]
async fn test_ingest_returns_surrogate_ids() {
    let (service, _store, _cache) = create_service();

    let stored = service.ingest(sample_order("TRK-IDS", 0)).await.unwrap();

    assert_ne!(stored.delivery.id, 0);
    assert_ne!(stored.payment.id, 0);
}
