//! OpenAPI document and interactive docs.

use axum::Router;
use utoipa::OpenApi;

use crate::api::dto::{
    AvatarDto, MemberDto, RoomDto, RoomListResponse, ToggleResponse, WatchChangeResponse,
    WatchListResponse,
};
use crate::api::handlers::{events, rooms, system, watches};
use crate::app_state::AppState;
use crate::domain::{RoomId, ToggleOutcome, WatchEvent};
use crate::error::{ErrorBody, ErrorResponse};
use crate::notify::Permission;
use crate::service::EngineStatus;

/// Path of the generated OpenAPI document.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// OpenAPI description of the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "roomwatch",
        description = "Watches full online rooms and notifies once when a slot frees up."
    ),
    paths(
        system::health_handler,
        system::status_handler,
        rooms::list_rooms,
        rooms::get_room,
        watches::list_watches,
        watches::subscribe,
        watches::unsubscribe,
        watches::toggle,
        events::stream,
    ),
    components(schemas(
        system::HealthResponse,
        EngineStatus,
        Permission,
        RoomId,
        RoomDto,
        MemberDto,
        AvatarDto,
        RoomListResponse,
        WatchListResponse,
        WatchChangeResponse,
        ToggleResponse,
        ToggleOutcome,
        WatchEvent,
        ErrorResponse,
        ErrorBody,
    )),
    tags(
        (name = "System", description = "Health and engine status"),
        (name = "Rooms", description = "Rooms from the latest poll"),
        (name = "Watches", description = "Vacancy watches on full rooms"),
        (name = "Events", description = "Live watch events"),
    )
)]
pub struct ApiDoc;

/// Routes serving the OpenAPI document, plus Swagger UI when the
/// `swagger-ui` feature is enabled.
#[cfg(feature = "swagger-ui")]
pub fn routes() -> Router<AppState> {
    use utoipa_swagger_ui::SwaggerUi;

    Router::new().merge(SwaggerUi::new("/swagger-ui").url(OPENAPI_PATH, ApiDoc::openapi()))
}

/// Routes serving the OpenAPI document, plus Swagger UI when the
/// `swagger-ui` feature is enabled.
#[cfg(not(feature = "swagger-ui"))]
pub fn routes() -> Router<AppState> {
    use axum::Json;
    use axum::routing::get;

    Router::new().route(OPENAPI_PATH, get(|| async { Json(ApiDoc::openapi()) }))
}
