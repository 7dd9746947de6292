//! WebSocket message types: inbound commands and outbound frames.
//!
//! Every frame is a UTF-8 JSON object with a `type` discriminator.
//! Inbound frames are classified into a closed [`ClientMessage`] set;
//! anything else is rejected with a [`RelayError`] rather than read
//! optimistically.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::action::DEFAULT_STROKE_WIDTH;
use crate::domain::{DrawSegment, SessionId, Tool};
use crate::error::RelayError;

pub use crate::service::frames::{ErrorPayload, ResetPayload, ServerMessage, encode_action};

/// Coordinates, color, and optional styling of a `draw` or shape command.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DrawCommand {
    /// Start x coordinate.
    pub x1: f64,
    /// Start y coordinate.
    pub y1: f64,
    /// End x coordinate.
    pub x2: f64,
    /// End y coordinate.
    pub y2: f64,
    /// Stroke color.
    pub color: String,
    /// Tool; `pen` when omitted.
    #[serde(default)]
    pub tool: Option<Tool>,
    /// Stroke width; [`DEFAULT_STROKE_WIDTH`] when omitted.
    #[serde(default)]
    pub width: Option<f64>,
    /// Display name of the sender.
    #[serde(default)]
    pub username: Option<String>,
}

impl DrawCommand {
    fn validate(&self) -> Result<(), RelayError> {
        if self.color.trim().is_empty() {
            return Err(RelayError::InvalidField {
                field: "color",
                reason: "must not be empty".to_string(),
            });
        }
        if let Some(width) = self.width
            && !(width.is_finite() && width > 0.0)
        {
            return Err(RelayError::InvalidField {
                field: "width",
                reason: format!("must be a positive number, got {width}"),
            });
        }
        Ok(())
    }

    /// Stamps the command with its author, producing a log entry.
    #[must_use]
    pub fn into_segment(self, session_id: SessionId) -> DrawSegment {
        DrawSegment {
            tool: self.tool.unwrap_or_default(),
            x1: self.x1,
            y1: self.y1,
            x2: self.x2,
            y2: self.y2,
            color: self.color,
            width: self.width.unwrap_or(DEFAULT_STROKE_WIDTH),
            session_id,
            username: self.username,
        }
    }
}

/// Commands a client can send.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// `draw`: one stroke segment.
    Draw(DrawCommand),
    /// `rectangle` / `circle`: a complete shape, stored as a one-segment
    /// stroke. The command's tool is already set to the shape.
    Shape(DrawCommand),
    /// `end_stroke`: closes the current stroke.
    EndStroke {
        /// Display name of the sender.
        username: Option<String>,
    },
    /// `undo`: removes the room's most recent complete stroke.
    Undo {
        /// Display name of the sender.
        username: Option<String>,
    },
}

impl ClientMessage {
    /// Parses and validates one inbound text frame.
    ///
    /// `draw` and shape fields may sit at the top level or be nested under
    /// a `payload` object.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::MessageTooLarge`] for frames over
    /// `max_bytes`, [`RelayError::MalformedMessage`] for invalid JSON or
    /// missing fields, [`RelayError::UnknownMessageType`] for an
    /// unrecognized `type`, and [`RelayError::InvalidField`] for values
    /// that parse but are unusable.
    pub fn parse(text: &str, max_bytes: usize) -> Result<Self, RelayError> {
        if text.len() > max_bytes {
            return Err(RelayError::MessageTooLarge {
                size: text.len(),
                limit: max_bytes,
            });
        }
        let value: Value = serde_json::from_str(text)?;
        let Some(envelope) = value.as_object() else {
            return Err(RelayError::MalformedMessage(
                "expected a JSON object".to_string(),
            ));
        };
        let Some(msg_type) = envelope.get("type").and_then(Value::as_str) else {
            return Err(RelayError::MalformedMessage(
                "missing string field `type`".to_string(),
            ));
        };

        match msg_type {
            "draw" => Ok(Self::Draw(parse_draw(envelope, None)?)),
            "rectangle" => Ok(Self::Shape(parse_draw(envelope, Some(Tool::Rectangle))?)),
            "circle" => Ok(Self::Shape(parse_draw(envelope, Some(Tool::Circle))?)),
            "end_stroke" => Ok(Self::EndStroke {
                username: username(envelope)?,
            }),
            "undo" => Ok(Self::Undo {
                username: username(envelope)?,
            }),
            other => Err(RelayError::UnknownMessageType(other.to_string())),
        }
    }

    /// Returns the wire `type` this message was parsed from.
    #[must_use]
    pub fn type_str(&self) -> &'static str {
        match self {
            Self::Draw(_) => "draw",
            Self::Shape(cmd) => cmd.tool.unwrap_or_default().as_str(),
            Self::EndStroke { .. } => "end_stroke",
            Self::Undo { .. } => "undo",
        }
    }
}

fn parse_draw(envelope: &Map<String, Value>, shape: Option<Tool>) -> Result<DrawCommand, RelayError> {
    let source = match envelope.get("payload") {
        Some(Value::Object(payload)) => payload,
        Some(Value::Null) | None => envelope,
        Some(_) => {
            return Err(RelayError::MalformedMessage(
                "`payload` must be an object".to_string(),
            ));
        }
    };
    let mut command = DrawCommand::deserialize(Value::Object(source.clone()))?;
    if command.username.is_none() {
        command.username = username(envelope)?;
    }
    if shape.is_some() {
        command.tool = shape;
    }
    command.validate()?;
    Ok(command)
}

fn username(envelope: &Map<String, Value>) -> Result<Option<String>, RelayError> {
    match envelope.get("username") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(name)) => Ok(Some(name.clone())),
        Some(_) => Err(RelayError::InvalidField {
            field: "username",
            reason: "must be a string".to_string(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const LIMIT: usize = 64 * 1024;

    fn parse(text: &str) -> Result<ClientMessage, RelayError> {
        ClientMessage::parse(text, LIMIT)
    }

    #[test]
    fn parses_flat_draw() {
        let Ok(ClientMessage::Draw(cmd)) =
            parse(r#"{"type":"draw","x1":0,"y1":0,"x2":10,"y2":10,"color":"red"}"#)
        else {
            panic!("expected draw");
        };
        assert_eq!(cmd.color, "red");
        assert_eq!(cmd.tool, None);
        let segment = cmd.into_segment(SessionId::new());
        assert_eq!(segment.tool, Tool::Pen);
        assert!((segment.width - DEFAULT_STROKE_WIDTH).abs() < f64::EPSILON);
    }

    #[test]
    fn parses_draw_nested_under_payload() {
        let text = r##"{"type":"draw","username":"ana","payload":{"x1":1,"y1":2,"x2":3,"y2":4,"color":"#00f","tool":"rectangle","width":4}}"##;
        let Ok(ClientMessage::Draw(cmd)) = parse(text) else {
            panic!("expected draw");
        };
        assert_eq!(cmd.tool, Some(Tool::Rectangle));
        assert_eq!(cmd.width, Some(4.0));
        assert_eq!(cmd.username.as_deref(), Some("ana"));
    }

    #[test]
    fn shape_types_force_their_tool() {
        let text = r#"{"type":"circle","x1":0,"y1":0,"x2":5,"y2":5,"color":"green","tool":"pen"}"#;
        let Ok(message) = parse(text) else {
            panic!("expected shape");
        };
        assert_eq!(message.type_str(), "circle");
        let ClientMessage::Shape(cmd) = message else {
            panic!("expected shape");
        };
        assert_eq!(cmd.tool, Some(Tool::Circle));
    }

    #[test]
    fn parses_end_stroke_and_undo() {
        assert_eq!(
            parse(r#"{"type":"end_stroke","username":"bo"}"#).ok(),
            Some(ClientMessage::EndStroke {
                username: Some("bo".to_string())
            })
        );
        assert_eq!(
            parse(r#"{"type":"undo"}"#).ok(),
            Some(ClientMessage::Undo { username: None })
        );
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(matches!(
            parse("{not json"),
            Err(RelayError::MalformedMessage(_))
        ));
        assert!(matches!(parse("[1,2]"), Err(RelayError::MalformedMessage(_))));
        assert!(matches!(
            parse(r#"{"x1":1}"#),
            Err(RelayError::MalformedMessage(_))
        ));
    }

    #[test]
    fn rejects_unknown_and_server_only_types() {
        assert!(matches!(
            parse(r#"{"type":"paint"}"#),
            Err(RelayError::UnknownMessageType(t)) if t == "paint"
        ));
        assert!(matches!(
            parse(r#"{"type":"reset","payload":{"actions":[]}}"#),
            Err(RelayError::UnknownMessageType(_))
        ));
    }

    #[test]
    fn rejects_missing_coordinates() {
        assert!(matches!(
            parse(r#"{"type":"draw","x1":0,"y1":0,"color":"red"}"#),
            Err(RelayError::MalformedMessage(_))
        ));
    }

    #[test]
    fn rejects_bad_field_values() {
        assert!(matches!(
            parse(r#"{"type":"draw","x1":0,"y1":0,"x2":1,"y2":1,"color":"  "}"#),
            Err(RelayError::InvalidField { field: "color", .. })
        ));
        assert!(matches!(
            parse(r#"{"type":"draw","x1":0,"y1":0,"x2":1,"y2":1,"color":"red","width":0}"#),
            Err(RelayError::InvalidField { field: "width", .. })
        ));
        assert!(matches!(
            parse(r#"{"type":"undo","username":7}"#),
            Err(RelayError::InvalidField { field: "username", .. })
        ));
        assert!(matches!(
            parse(r#"{"type":"draw","x1":0,"y1":0,"x2":1,"y2":1,"color":"red","tool":"spray"}"#),
            Err(RelayError::MalformedMessage(_))
        ));
    }

    #[test]
    fn rejects_oversized_frames() {
        let text = format!(r#"{{"type":"undo","username":"{}"}}"#, "a".repeat(64));
        assert!(matches!(
            ClientMessage::parse(&text, 16),
            Err(RelayError::MessageTooLarge { limit: 16, .. })
        ));
    }
}
