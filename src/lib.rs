//! # sketchroom-relay
//!
//! WebSocket relay for real-time collaborative drawing rooms.
//!
//! Clients connected to the same room see each other's strokes and shapes
//! live. Each room keeps an authoritative action log; a client joining
//! late is brought up to date with a `reset` snapshot, and an `undo` from
//! any client removes the room's most recent complete stroke for everyone.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket, HTTP)
//!     │
//!     ├── WS Handler + Connection loop (ws/)
//!     ├── REST inspection handlers (api/)
//!     │
//!     ├── RelayService (service/)
//!     │
//!     ├── RoomRegistry ── Room (log + SessionRegistry) (domain/)
//!     └── Undo engine (domain/undo)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod ws;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use app_state::AppState;
use config::RelayConfig;
use domain::RoomRegistry;
use service::RelayService;

/// Builds application state from configuration.
#[must_use]
pub fn build_state(config: RelayConfig) -> AppState {
    let registry = Arc::new(RoomRegistry::new());
    let relay_service = Arc::new(RelayService::new(registry, config.room_gc_enabled));
    AppState {
        relay_service,
        config: Arc::new(config),
    }
}

/// Builds the full router: WebSocket relay, REST API, tracing, and CORS.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(api::build_router())
        .merge(ws::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
