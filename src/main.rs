//! sketchroom-relay server entry point.
//!
//! Starts the Axum HTTP server with the WebSocket relay and REST
//! inspection endpoints.

use tracing_subscriber::EnvFilter;

use sketchroom_relay::config::{LogFormat, RelayConfig};
use sketchroom_relay::{build_app, build_state};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = RelayConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    tracing::info!(
        addr = %config.listen_addr,
        default_room = %config.default_room,
        room_gc = config.room_gc_enabled,
        "starting sketchroom-relay"
    );

    let listen_addr = config.listen_addr;
    let app = build_app(build_state(config));

    // Start server
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(addr = %listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
