use axum::body::Body;
use axum::http::Request;
use tower::ServiceExt;
use uuid::Uuid;

use super::*;
use crate::cache::InMemoryOrderCache;
use crate::storage::MockOrderStore;
use crate::test_utils::sample_order;

fn create_app() -> (Router, Arc<OrderService>, Arc<MockOrderStore>) {
    let store = Arc::new(MockOrderStore::new());
    let service = Arc::new(OrderService::new(
        store.clone(),
        Arc::new(InMemoryOrderCache::new()),
    ));
    (router(service.clone()), service, store)
}

async fn send_get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_health() {
    let (app, _, _) = create_app();
    let (status, _) = send_get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_get_order_returns_json() {
    let (app, service, _) = create_app();
    let order = sample_order("TRK-HTTP", 2);
    service.ingest(order.clone()).await.unwrap();

    let (status, body) = send_get(app, &format!("/orders/{}", order.order_uid)).await;

    assert_eq!(status, StatusCode::OK);
    let returned: Order = serde_json::from_slice(&body).unwrap();
    assert_eq!(returned, order);

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json["delivery"].get("id").is_none());
    assert_eq!(json["payment"]["amount"], 1817);
}

#[tokio::test]
async fn test_invalid_uid_is_bad_request() {
    let (app, _, store) = create_app();

    let (status, body) = send_get(app, "/orders/not-a-uuid").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(err.code, 400);
    assert!(err.msg.contains("not-a-uuid"));
    assert_eq!(store.total_calls(), 0);
}

#[tokio::test]
async fn test_unknown_uid_is_not_found() {
    let (app, _, _) = create_app();

    let (status, body) = send_get(app, &format!("/orders/{}", Uuid::new_v4())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(err.code, 404);
}

#[tokio::test]
async fn test_store_failure_is_internal_error_without_details() {
    let (app, _, store) = create_app();
    store.set_fail_on_get(true).await;

    let (status, body) = send_get(app, &format!("/orders/{}", Uuid::new_v4())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        err,
        ErrorResponse {
            code: 500,
            msg: INTERNAL_MSG.to_string(),
        }
    );
}

#[test]
fn test_status_mapping() {
    assert_eq!(status_for(ErrorKind::InvalidIdentifier), StatusCode::BAD_REQUEST);
    assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
    assert_eq!(status_for(ErrorKind::Integrity), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(status_for(ErrorKind::Internal), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_assets_served_beside_api() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>lookup</h1>").unwrap();
    let (app, _, _) = create_app();
    let app = with_assets(app, dir.path().to_str().unwrap());

    let (status, body) = send_get(app.clone(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"<h1>lookup</h1>");

    let (status, _) = send_get(app.clone(), "/missing.js").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_get(app, "/orders/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_serve_reports_bind_failure() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = taken.local_addr().unwrap().to_string();
    let (_, service, _) = create_app();

    let result = serve(service, &addr, None, CancellationToken::new()).await;

    assert!(result.is_err());
}
