//! Watch DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{RoomId, ToggleOutcome};

/// Response for `GET /watches`.
#[derive(Debug, Serialize, ToSchema)]
pub struct WatchListResponse {
    /// Watched room ids, sorted.
    pub data: Vec<RoomId>,
    /// Number of active watches.
    pub count: usize,
}

/// Response for `PUT /watches/{id}` and `DELETE /watches/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct WatchChangeResponse {
    /// Target room.
    pub room_id: RoomId,
    /// Whether a watch is active after the call.
    pub watching: bool,
    /// Whether the call changed the watch set.
    pub changed: bool,
}

/// Response for `POST /watches/{id}/toggle`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ToggleResponse {
    /// Target room.
    pub room_id: RoomId,
    /// What the toggle did.
    pub outcome: ToggleOutcome,
    /// Whether a watch is active after the call.
    pub watching: bool,
}
