//! Room listing handlers.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{RoomDto, RoomListParams, RoomListResponse};
use crate::app_state::AppState;
use crate::domain::RoomFilter;
use crate::error::{ErrorResponse, WatchError};

/// `GET /rooms` — List rooms from the current snapshot.
///
/// # Errors
///
/// Returns [`WatchError::EngineUnavailable`] during shutdown.
#[utoipa::path(
    get,
    path = "/api/v1/rooms",
    tag = "Rooms",
    summary = "List rooms",
    description = "Returns rooms from the latest poll that pass the password and region filters, each with its watch state and join link. Rooms without members are never listed.",
    params(RoomListParams),
    responses(
        (status = 200, description = "Filtered room list", body = RoomListResponse),
        (status = 503, description = "Engine stopped", body = ErrorResponse),
    )
)]
pub async fn list_rooms(
    State(state): State<AppState>,
    Query(params): Query<RoomListParams>,
) -> Result<impl IntoResponse, WatchError> {
    let view = state.watch.rooms().await?;
    let filter = RoomFilter::from(params);

    let data: Vec<RoomDto> = filter
        .apply(view.snapshot.rooms())
        .into_iter()
        .map(|room| {
            RoomDto::from_room(
                room,
                view.is_watched(room.id.as_str()),
                &state.join_url_base,
            )
        })
        .collect();

    Ok(Json(RoomListResponse {
        total: data.len(),
        data,
        snapshot_fetched_at: view.snapshot.fetched_at(),
    }))
}

/// `GET /rooms/{id}` — Get a single room.
///
/// # Errors
///
/// Returns [`WatchError::RoomNotFound`] if the room is not in the current
/// snapshot.
#[utoipa::path(
    get,
    path = "/api/v1/rooms/{id}",
    tag = "Rooms",
    summary = "Get room",
    description = "Returns one room from the latest poll with its watch state.",
    params(
        ("id" = String, Path, description = "Room id"),
    ),
    responses(
        (status = 200, description = "Room details", body = RoomDto),
        (status = 404, description = "Room not in snapshot", body = ErrorResponse),
    )
)]
pub async fn get_room(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, WatchError> {
    let (room, watched) = state.watch.room(&id).await?;
    Ok(Json(RoomDto::from_room(&room, watched, &state.join_url_base)))
}

/// Room routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(list_rooms))
        .route("/rooms/{id}", get(get_room))
}
