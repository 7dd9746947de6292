//! WebSocket layer: upgrade handlers, connection loop, wire messages.
//!
//! Clients connect to `/ws/{room_id}` (or `/ws` for the default room),
//! receive a `reset` snapshot, and from then on exchange `draw`,
//! `end_stroke`, and `undo` frames with the room.

pub mod connection;
pub mod handler;
pub mod messages;

use axum::Router;
use axum::routing::get;

use crate::app_state::AppState;

/// WebSocket routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(handler::ws_handler))
        .route("/ws/{room_id}", get(handler::ws_room_handler))
}
