//! Outbound frame encoding.
//!
//! The service enqueues frames while it holds a room lock, so encoding
//! lives here rather than in the transport layer. `ws::messages`
//! re-exports these types for the wire side.

use serde::{Deserialize, Serialize};

use crate::domain::{Action, OutboundFrame};
use crate::error::RelayError;

/// Body of a `reset` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetPayload {
    /// The room's full log, oldest first.
    pub actions: Vec<Action>,
}

/// Body of an `error` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Numeric code from [`RelayError::error_code`].
    pub code: u32,
    /// Human-readable description.
    pub message: String,
}

/// Server-originated frames.
///
/// Relayed `draw` / `end_stroke` frames are plain serialized [`Action`]s
/// and go through [`encode_action`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full log snapshot, sent on join and after every undo.
    Reset {
        /// Snapshot body.
        payload: ResetPayload,
    },
    /// Notice that one of the session's frames was dropped.
    Error {
        /// Error body.
        payload: ErrorPayload,
    },
}

impl ServerMessage {
    /// Builds a `reset` frame carrying `actions`.
    #[must_use]
    pub const fn reset(actions: Vec<Action>) -> Self {
        Self::Reset {
            payload: ResetPayload { actions },
        }
    }

    /// Builds an `error` frame describing `err`.
    #[must_use]
    pub fn error(err: &RelayError) -> Self {
        Self::Error {
            payload: ErrorPayload {
                code: err.error_code(),
                message: err.to_string(),
            },
        }
    }

    /// Serializes the message into a shareable frame.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Internal`] if serialization fails.
    pub fn encode(&self) -> Result<OutboundFrame, RelayError> {
        encode(self)
    }
}

/// Serializes a committed action into a relay frame.
///
/// # Errors
///
/// Returns [`RelayError::Internal`] if serialization fails.
pub fn encode_action(action: &Action) -> Result<OutboundFrame, RelayError> {
    encode(action)
}

fn encode<T: Serialize>(value: &T) -> Result<OutboundFrame, RelayError> {
    serde_json::to_string(value)
        .map(OutboundFrame::from)
        .map_err(|err| RelayError::Internal(format!("failed to encode frame: {err}")))
}
