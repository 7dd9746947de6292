//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;

use crate::domain::RoomId;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8000`).
    pub listen_addr: SocketAddr,

    /// Room joined by connections to the addressless `/ws` endpoint.
    pub default_room: RoomId,

    /// Outbound frames buffered per session before it is evicted as slow.
    pub session_queue_capacity: usize,

    /// Largest inbound text frame accepted, in bytes.
    pub max_message_bytes: usize,

    /// Whether a session is told about frames it sent that were dropped.
    pub notify_protocol_errors: bool,

    /// Whether a room is dropped once its last session leaves.
    pub room_gc_enabled: bool,

    /// Tracing output format.
    pub log_format: LogFormat,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            default_room: RoomId::default(),
            session_queue_capacity: 1024,
            max_message_bytes: 64 * 1024,
            notify_protocol_errors: true,
            room_gc_enabled: false,
            log_format: LogFormat::Text,
        }
    }
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as a
    /// [`SocketAddr`], or if `DEFAULT_ROOM` is not a valid room id.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let listen_addr: SocketAddr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.listen_addr,
        };

        let default_room = match std::env::var("DEFAULT_ROOM") {
            Ok(raw) => RoomId::new(raw)?,
            Err(_) => defaults.default_room,
        };

        let session_queue_capacity =
            parse_env("SESSION_QUEUE_CAPACITY", defaults.session_queue_capacity).max(1);
        let max_message_bytes = parse_env("MAX_MESSAGE_BYTES", defaults.max_message_bytes);
        let notify_protocol_errors =
            parse_env_bool("NOTIFY_PROTOCOL_ERRORS", defaults.notify_protocol_errors);
        let room_gc_enabled = parse_env_bool("ROOM_GC_ENABLED", defaults.room_gc_enabled);

        let log_format = match std::env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            default_room,
            session_queue_capacity,
            max_message_bytes,
            notify_protocol_errors,
            room_gc_enabled,
            log_format,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().as_deref() {
        Some("true") | Some("TRUE") | Some("1") => true,
        Some("false") | Some("FALSE") | Some("0") => false,
        _ => default,
    }
}
