//! System endpoints: health check and engine status.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::error::{ErrorResponse, WatchError};
use crate::service::EngineStatus;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `GET /status` — Snapshot age, watch count and notification permission.
///
/// # Errors
///
/// Returns [`WatchError::EngineUnavailable`] during shutdown.
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "System",
    summary = "Engine status",
    description = "Reports the current snapshot, the last refresh error, the number of active watches and the notification permission.",
    responses(
        (status = 200, description = "Engine status", body = EngineStatus),
        (status = 503, description = "Engine stopped", body = ErrorResponse),
    )
)]
pub async fn status_handler(State(state): State<AppState>) -> Result<impl IntoResponse, WatchError> {
    Ok(Json(state.watch.status().await?))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}

/// Status route mounted under /api/v1.
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/status", get(status_handler))
}
