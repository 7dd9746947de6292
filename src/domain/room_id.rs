//! Type-safe room identifier.
//!
//! [`RoomId`] wraps the room key taken from the connection path
//! (`/ws/{room_id}`) so that room keys cannot be confused with other
//! strings flowing through the relay.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Room used when a connection does not name one.
pub const DEFAULT_ROOM_ID: &str = "lobby";

/// Maximum accepted length of a room identifier, in characters.
pub const MAX_ROOM_ID_LEN: usize = 128;

/// Identifier of a drawing room.
///
/// Non-empty, at most [`MAX_ROOM_ID_LEN`] characters, and free of control
/// characters. Used as the key in [`super::RoomRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Validates and wraps a room identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidRoomId`] if the identifier is empty,
    /// too long, or contains control characters.
    pub fn new(raw: impl Into<String>) -> Result<Self, RelayError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(RelayError::InvalidRoomId("room id must not be empty".to_string()));
        }
        if raw.chars().count() > MAX_ROOM_ID_LEN {
            return Err(RelayError::InvalidRoomId(format!(
                "room id exceeds {MAX_ROOM_ID_LEN} characters"
            )));
        }
        if raw.chars().any(char::is_control) {
            return Err(RelayError::InvalidRoomId(
                "room id must not contain control characters".to_string(),
            ));
        }
        Ok(Self(raw))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self(DEFAULT_ROOM_ID.to_string())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomId {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for RoomId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifier() {
        let Ok(id) = RoomId::new("r1") else {
            panic!("valid room id");
        };
        assert_eq!(id.as_str(), "r1");
        assert_eq!(id.to_string(), "r1");
    }

    #[test]
    fn rejects_empty_and_blank() {
        assert!(RoomId::new("").is_err());
        assert!(RoomId::new("   ").is_err());
    }

    #[test]
    fn rejects_overlong() {
        let long = "x".repeat(MAX_ROOM_ID_LEN + 1);
        assert!(RoomId::new(long).is_err());
        let max = "x".repeat(MAX_ROOM_ID_LEN);
        assert!(RoomId::new(max).is_ok());
    }

    #[test]
    fn rejects_control_characters() {
        assert!(RoomId::new("a\nb").is_err());
    }

    #[test]
    fn default_is_lobby() {
        assert_eq!(RoomId::default().as_str(), DEFAULT_ROOM_ID);
    }

    #[test]
    fn parses_via_from_str() {
        let parsed: Result<RoomId, _> = "design-review".parse();
        assert!(parsed.is_ok());
    }
}
