//! Room inspection handlers: list and get.
//!
//! Read-only views of room state. Looking a room up here never creates it.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{PaginationParams, RoomDetailResponse, RoomListResponse, RoomSummaryDto};
use crate::app_state::AppState;
use crate::domain::RoomId;
use crate::error::{ErrorResponse, RelayError};

/// `GET /rooms` — List rooms with pagination.
#[utoipa::path(
    get,
    path = "/api/v1/rooms",
    tag = "Rooms",
    summary = "List rooms",
    description = "Returns a paginated list of all rooms known to the relay, sorted by room id.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated room list", body = RoomListResponse),
    )
)]
pub async fn list_rooms(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let summaries = state.relay_service.list_rooms().await;
    let (page, pagination) = params.paginate(summaries);
    Json(RoomListResponse {
        data: page.into_iter().map(RoomSummaryDto::from).collect(),
        pagination,
    })
}

/// `GET /rooms/{room_id}` — Get a room's summary and current log.
///
/// # Errors
///
/// Returns [`RelayError::InvalidRoomId`] for an unusable id and
/// [`RelayError::RoomNotFound`] if the room does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/rooms/{room_id}",
    tag = "Rooms",
    summary = "Get room details",
    description = "Returns the room summary together with its full action log, in the same shape as a `reset` payload.",
    params(
        ("room_id" = String, Path, description = "Room identifier"),
    ),
    responses(
        (status = 200, description = "Room details", body = RoomDetailResponse),
        (status = 400, description = "Invalid room id", body = ErrorResponse),
        (status = 404, description = "Room not found", body = ErrorResponse),
    )
)]
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<impl IntoResponse, RelayError> {
    let room_id = RoomId::new(room_id)?;
    let (summary, actions) = state.relay_service.detail(&room_id).await?;
    Ok(Json(RoomDetailResponse {
        room: RoomSummaryDto::from(summary),
        actions,
    }))
}

/// Room routes, mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(list_rooms))
        .route("/rooms/{room_id}", get(get_room))
}
