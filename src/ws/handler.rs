//! Axum WebSocket upgrade handlers.

use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};

use super::connection::{ConnectionSettings, run_connection};
use crate::app_state::AppState;
use crate::domain::RoomId;
use crate::error::RelayError;

/// `GET /ws` — Upgrade to WebSocket and join the default room.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let room_id = state.config.default_room.clone();
    upgrade(ws, &state, room_id)
}

/// `GET /ws/{room_id}` — Upgrade to WebSocket and join `room_id`.
///
/// # Errors
///
/// Returns [`RelayError::InvalidRoomId`] (400) before upgrading if the
/// room id is unusable.
pub async fn ws_room_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, RelayError> {
    let room_id = RoomId::new(room_id)?;
    Ok(upgrade(ws, &state, room_id))
}

fn upgrade(ws: WebSocketUpgrade, state: &AppState, room_id: RoomId) -> Response {
    let service = Arc::clone(&state.relay_service);
    let settings = ConnectionSettings::from(state.config.as_ref());
    ws.on_upgrade(move |socket| run_connection(socket, room_id, service, settings))
        .into_response()
}
