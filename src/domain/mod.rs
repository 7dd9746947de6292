//! Domain layer: actions, undo engine, rooms, and session membership.
//!
//! This module contains the server-side model of a drawing room: the
//! immutable [`Action`] records that make up a room log, the pure undo
//! engine, per-room membership with broadcast primitives, and the room
//! registry that serializes access per room.

pub mod action;
pub mod room;
pub mod room_id;
pub mod room_registry;
pub mod session_id;
pub mod session_registry;
pub mod undo;

pub use action::{Action, DrawSegment, EndStroke, Tool};
pub use room::{Room, RoomSummary};
pub use room_id::RoomId;
pub use room_registry::{RoomHandle, RoomRegistry};
pub use session_id::SessionId;
pub use session_registry::{BroadcastOutcome, OutboundFrame, SessionHandle, SessionRegistry};
