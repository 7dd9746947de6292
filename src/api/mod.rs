//! REST API layer: inspection handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` sits at the
//! root. The relay itself speaks WebSocket (see [`crate::ws`]).

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "sketchroom-relay", description = "Inspection API for collaborative drawing rooms"),
    paths(
        handlers::system::health_handler,
        handlers::room::list_rooms,
        handlers::room::get_room,
    ),
    components(schemas(
        handlers::system::HealthResponse,
        dto::RoomSummaryDto,
        dto::RoomListResponse,
        dto::RoomDetailResponse,
        dto::PaginationMeta,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "System", description = "Service health"),
        (name = "Rooms", description = "Read-only room inspection"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
