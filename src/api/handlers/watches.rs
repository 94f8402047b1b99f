//! Watch handlers: list, subscribe, unsubscribe, toggle.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::api::dto::{ToggleResponse, WatchChangeResponse, WatchListResponse};
use crate::app_state::AppState;
use crate::domain::{RoomId, ToggleOutcome};
use crate::error::{ErrorResponse, WatchError};

fn parse_room_id(raw: String) -> Result<RoomId, WatchError> {
    if raw.trim().is_empty() {
        return Err(WatchError::InvalidRequest("room id must not be empty".to_string()));
    }
    Ok(RoomId::from(raw))
}

/// `GET /watches` — List active watches.
///
/// # Errors
///
/// Returns [`WatchError::EngineUnavailable`] during shutdown.
#[utoipa::path(
    get,
    path = "/api/v1/watches",
    tag = "Watches",
    summary = "List watches",
    description = "Returns the ids of every room with an active watch.",
    responses(
        (status = 200, description = "Active watches", body = WatchListResponse),
        (status = 503, description = "Engine stopped", body = ErrorResponse),
    )
)]
pub async fn list_watches(State(state): State<AppState>) -> Result<impl IntoResponse, WatchError> {
    let data = state.watch.watches().await?;
    Ok(Json(WatchListResponse {
        count: data.len(),
        data,
    }))
}

/// `PUT /watches/{id}` — Watch a room.
///
/// # Errors
///
/// Returns [`WatchError::InvalidRequest`] for an empty id.
#[utoipa::path(
    put,
    path = "/api/v1/watches/{id}",
    tag = "Watches",
    summary = "Watch a room",
    description = "Adds a watch without checking occupancy. If the room already has a free slot the notification fires immediately and the watch is consumed.",
    params(
        ("id" = String, Path, description = "Room id"),
    ),
    responses(
        (status = 200, description = "Watch state after the call", body = WatchChangeResponse),
        (status = 400, description = "Invalid id", body = ErrorResponse),
    )
)]
pub async fn subscribe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, WatchError> {
    let room_id = parse_room_id(id)?;
    let changed = state.watch.subscribe(room_id.clone()).await?;
    let watching = state.watch.rooms().await?.is_watched(room_id.as_str());
    Ok(Json(WatchChangeResponse {
        room_id,
        watching,
        changed,
    }))
}

/// `DELETE /watches/{id}` — Cancel a watch.
///
/// # Errors
///
/// Returns [`WatchError::InvalidRequest`] for an empty id.
#[utoipa::path(
    delete,
    path = "/api/v1/watches/{id}",
    tag = "Watches",
    summary = "Cancel a watch",
    description = "Removes the watch on a room. Idempotent.",
    params(
        ("id" = String, Path, description = "Room id"),
    ),
    responses(
        (status = 200, description = "Watch state after the call", body = WatchChangeResponse),
        (status = 400, description = "Invalid id", body = ErrorResponse),
    )
)]
pub async fn unsubscribe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, WatchError> {
    let room_id = parse_room_id(id)?;
    let changed = state.watch.unsubscribe(room_id.clone()).await?;
    Ok(Json(WatchChangeResponse {
        room_id,
        watching: false,
        changed,
    }))
}

/// `POST /watches/{id}/toggle` — Flip the watch on a full room.
///
/// # Errors
///
/// Returns [`WatchError::RoomNotFound`] or [`WatchError::RoomNotFull`]
/// when a watch cannot be added.
#[utoipa::path(
    post,
    path = "/api/v1/watches/{id}/toggle",
    tag = "Watches",
    summary = "Toggle a watch",
    description = "Removes an existing watch, or adds one if the room is currently full.",
    params(
        ("id" = String, Path, description = "Room id"),
    ),
    responses(
        (status = 200, description = "Toggle outcome", body = ToggleResponse),
        (status = 404, description = "Room not in snapshot", body = ErrorResponse),
        (status = 409, description = "Room has a free slot", body = ErrorResponse),
    )
)]
pub async fn toggle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, WatchError> {
    let room_id = parse_room_id(id)?;
    let outcome = state.watch.toggle(room_id.clone()).await?;
    let watching = match outcome {
        ToggleOutcome::Subscribed => state.watch.rooms().await?.is_watched(room_id.as_str()),
        ToggleOutcome::Unsubscribed => false,
    };
    Ok(Json(ToggleResponse {
        room_id,
        outcome,
        watching,
    }))
}

/// Watch routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/watches", get(list_watches))
        .route("/watches/{id}", put(subscribe).delete(unsubscribe))
        .route("/watches/{id}/toggle", post(toggle))
}
