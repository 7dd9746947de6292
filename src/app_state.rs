//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::RelayConfig;
use crate::service::RelayService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Relay service owning every room.
    pub relay_service: Arc<RelayService>,
    /// Configuration the server was started with.
    pub config: Arc<RelayConfig>,
}
