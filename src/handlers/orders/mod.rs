//! REST API for order lookups.
//!
//! Endpoints:
//! - `GET /orders/{order_uid}` — the order as JSON
//! - `GET /health` — liveness check
//! - anything else: static files from the assets directory, when configured
//!
//! Failures use `{"code": <status>, "msg": <text>}`: 400 for a malformed
//! identifier, 404 for an unknown order, 500 for everything else.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::model::Order;
use crate::services::{ErrorKind, OrderService, ServiceError};

/// Shared state for axum handlers.
type AppState = Arc<OrderService>;

/// Error body returned for every non-2xx response.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: u16,
    pub msg: String,
}

/// Message returned for failures whose details stay in the logs.
const INTERNAL_MSG: &str = "internal server error";

/// Start the HTTP server on `addr` and run until `shutdown` is cancelled.
pub async fn serve(
    service: Arc<OrderService>,
    addr: &str,
    assets_dir: Option<&str>,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let app = match assets_dir {
        Some(dir) => with_assets(router(service), dir),
        None => router(service),
    };
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Order API listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

/// Build the axum router (separated for testing).
pub fn router(service: Arc<OrderService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/orders/{order_uid}", get(get_order))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Serve files under `dir` for every path the API does not route.
pub fn with_assets(router: Router, dir: &str) -> Router {
    router.fallback_service(ServeDir::new(dir))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn get_order(
    State(service): State<AppState>,
    Path(order_uid): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order = service.lookup(&order_uid).await?;
    Ok(Json(order))
}

/// Adapter from service errors to HTTP responses.
struct ApiError(ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidIdentifier | ErrorKind::ValidationFailed => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(self.0.kind());
        let msg = if status.is_server_error() {
            error!(error = %self.0, "Order lookup failed");
            INTERNAL_MSG.to_string()
        } else {
            self.0.to_string()
        };

        let body = ErrorResponse {
            code: status.as_u16(),
            msg,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests;
