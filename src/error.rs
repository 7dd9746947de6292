//! Relay error types with protocol and HTTP status code mapping.
//!
//! [`RelayError`] is the central error type. Protocol errors raised while
//! handling a WebSocket frame are recovered locally by the connection
//! handler; the HTTP inspection endpoints turn the same enum into a
//! structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{RoomId, SessionId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "room not found: r1",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Relay error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status               |
/// |-----------|-----------------|---------------------------|
/// | 1000–1999 | Protocol/Input  | 400 Bad Request / 413     |
/// | 2000–2999 | State/Not Found | 404 Not Found             |
/// | 3000–3999 | Server          | 500 Internal Server Error |
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Frame is not valid JSON or does not match the envelope shape.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// The envelope's `type` is not one the relay understands.
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),

    /// A field is present but its value is not acceptable.
    #[error("invalid field `{field}`: {reason}")]
    InvalidField {
        /// Offending field name.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Frame exceeds the configured size limit.
    #[error("message of {size} bytes exceeds limit of {limit} bytes")]
    MessageTooLarge {
        /// Size of the received frame in bytes.
        size: usize,
        /// Configured maximum in bytes.
        limit: usize,
    },

    /// Room id is empty, too long, or otherwise unusable.
    #[error("invalid room id: {0}")]
    InvalidRoomId(String),

    /// No room with the given id exists.
    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    /// The session is no longer a member of its room (left or evicted).
    #[error("session {0} is not joined to a room")]
    SessionNotJoined(SessionId),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::MalformedMessage(_) => 1001,
            Self::UnknownMessageType(_) => 1002,
            Self::InvalidField { .. } => 1003,
            Self::MessageTooLarge { .. } => 1004,
            Self::InvalidRoomId(_) => 1005,
            Self::RoomNotFound(_) => 2001,
            Self::SessionNotJoined(_) => 2002,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedMessage(_)
            | Self::UnknownMessageType(_)
            | Self::InvalidField { .. }
            | Self::InvalidRoomId(_) => StatusCode::BAD_REQUEST,
            Self::MessageTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RoomNotFound(_) | Self::SessionNotJoined(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns `true` for errors caused by a single bad client frame.
    ///
    /// These are dropped and the session continues.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedMessage(_)
                | Self::UnknownMessageType(_)
                | Self::InvalidField { .. }
                | Self::MessageTooLarge { .. }
        )
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedMessage(err.to_string())
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_statuses_line_up() {
        let err = RelayError::UnknownMessageType("paint".to_string());
        assert_eq!(err.error_code(), 1002);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.is_protocol_error());

        let Ok(room) = RoomId::new("r1") else {
            panic!("valid room id");
        };
        let err = RelayError::RoomNotFound(room);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(!err.is_protocol_error());
        assert_eq!(err.to_string(), "room not found: r1");
    }

    #[test]
    fn json_errors_become_malformed() {
        let Err(json_err) = serde_json::from_str::<serde_json::Value>("{") else {
            panic!("expected parse failure");
        };
        let err = RelayError::from(json_err);
        assert_eq!(err.error_code(), 1001);
    }

    #[test]
    fn into_response_sets_status() {
        let response = RelayError::Internal("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
