//! REST endpoint handlers organized by resource.

pub mod events;
pub mod rooms;
pub mod system;
pub mod watches;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(rooms::routes())
        .merge(watches::routes())
        .merge(events::routes())
        .merge(system::api_routes())
}
