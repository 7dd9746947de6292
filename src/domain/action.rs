//! Committed drawing actions stored in a room log.
//!
//! An [`Action`] is an immutable record of one user event. The serialized
//! form doubles as the wire form: relayed `draw` / `end_stroke` frames and
//! the entries of a `reset` snapshot share the same shape.

use serde::{Deserialize, Serialize};

use super::SessionId;

/// Stroke width used when a client does not send one.
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;

/// Drawing tool that produced a segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Freehand pen.
    #[default]
    Pen,
    /// Axis-aligned rectangle spanning the two points.
    Rectangle,
    /// Ellipse inscribed in the box spanning the two points.
    Circle,
}

impl Tool {
    /// Returns the tool name as used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pen => "pen",
            Self::Rectangle => "rectangle",
            Self::Circle => "circle",
        }
    }
}

/// One segment of a stroke, or a whole shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawSegment {
    /// Tool that produced the segment.
    #[serde(default)]
    pub tool: Tool,
    /// Start x coordinate.
    pub x1: f64,
    /// Start y coordinate.
    pub y1: f64,
    /// End x coordinate.
    pub x2: f64,
    /// End y coordinate.
    pub y2: f64,
    /// Stroke color, passed through verbatim (e.g. `"red"`, `"#ff0000"`).
    pub color: String,
    /// Stroke width in canvas units.
    pub width: f64,
    /// Session that committed the segment.
    pub session_id: SessionId,
    /// Display name supplied by the client, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Marker closing the stroke made of the preceding segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndStroke {
    /// Session that ended the stroke.
    pub session_id: SessionId,
    /// Display name supplied by the client, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Entry in a room's action log.
///
/// Undo is a command and never appears here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// A stroke segment or shape.
    Draw(DrawSegment),
    /// End of the current stroke.
    EndStroke(EndStroke),
}

impl Action {
    /// Builds an end-of-stroke marker for `session_id`.
    #[must_use]
    pub const fn end_stroke(session_id: SessionId, username: Option<String>) -> Self {
        Self::EndStroke(EndStroke {
            session_id,
            username,
        })
    }

    /// Returns `true` for [`Action::EndStroke`].
    #[must_use]
    pub const fn is_end_stroke(&self) -> bool {
        matches!(self, Self::EndStroke(_))
    }

    /// Returns the wire `type` tag.
    #[must_use]
    pub const fn type_str(&self) -> &'static str {
        match self {
            Self::Draw(_) => "draw",
            Self::EndStroke(_) => "end_stroke",
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn segment(session_id: SessionId) -> DrawSegment {
        DrawSegment {
            tool: Tool::Pen,
            x1: 0.0,
            y1: 0.0,
            x2: 10.0,
            y2: 10.0,
            color: "red".to_string(),
            width: DEFAULT_STROKE_WIDTH,
            session_id,
            username: None,
        }
    }

    #[test]
    fn draw_serializes_with_type_tag() {
        let action = Action::Draw(segment(SessionId::new()));
        let Ok(value) = serde_json::to_value(&action) else {
            panic!("serialization failed");
        };
        assert_eq!(value["type"], "draw");
        assert_eq!(value["tool"], "pen");
        assert_eq!(value["color"], "red");
        assert_eq!(value["x2"], 10.0);
        assert!(value.get("username").is_none());
    }

    #[test]
    fn end_stroke_serializes_with_snake_case_tag() {
        let action = Action::end_stroke(SessionId::new(), Some("ana".to_string()));
        let Ok(value) = serde_json::to_value(&action) else {
            panic!("serialization failed");
        };
        assert_eq!(value["type"], "end_stroke");
        assert_eq!(value["username"], "ana");
        assert!(action.is_end_stroke());
    }

    #[test]
    fn accessors_report_tag() {
        let sid = SessionId::new();
        let draw = Action::Draw(segment(sid));
        assert_eq!(draw.type_str(), "draw");
        assert!(!draw.is_end_stroke());
    }

    #[test]
    fn parses_snapshot_entry() {
        let sid = SessionId::new();
        let json = format!(
            r#"{{"type":"draw","tool":"circle","x1":1,"y1":2,"x2":3,"y2":4,"color":"blue","width":3.5,"session_id":"{sid}"}}"#
        );
        let Ok(Action::Draw(parsed)) = serde_json::from_str::<Action>(&json) else {
            panic!("expected draw action");
        };
        assert_eq!(parsed.tool, Tool::Circle);
        assert_eq!(parsed.session_id, sid);
    }
}
