//! Room state: the authoritative action log plus membership of one room.
//!
//! A [`Room`] is always accessed behind its own lock in the
//! [`super::RoomRegistry`]; none of the methods here perform I/O beyond
//! enqueueing frames on session channels.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::session_registry::{SessionHandle, SessionRegistry};
use super::undo::{stroke_count, undo_in_place};
use super::{Action, RoomId, SessionId};

/// One collaboration room.
#[derive(Debug)]
pub struct Room {
    room_id: RoomId,
    actions: Vec<Action>,
    sessions: SessionRegistry,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
    appended_total: u64,
    undo_total: u64,
    retired: bool,
}

impl Room {
    /// Creates an empty room.
    #[must_use]
    pub fn new(room_id: RoomId) -> Self {
        let now = Utc::now();
        Self {
            room_id,
            actions: Vec::new(),
            sessions: SessionRegistry::new(),
            created_at: now,
            last_activity_at: now,
            appended_total: 0,
            undo_total: 0,
            retired: false,
        }
    }

    /// Registers a session and returns the current log.
    pub fn join(&mut self, handle: SessionHandle) -> Vec<Action> {
        self.sessions.add(handle);
        self.touch();
        self.actions.clone()
    }

    /// Appends an action to the log.
    pub fn append(&mut self, action: Action) {
        self.actions.push(action);
        self.appended_total = self.appended_total.saturating_add(1);
        self.touch();
    }

    /// Removes the most recent complete stroke and returns the new log.
    pub fn undo(&mut self) -> Vec<Action> {
        let removed = undo_in_place(&mut self.actions);
        self.undo_total = self.undo_total.saturating_add(1);
        self.touch();
        tracing::debug!(room_id = %self.room_id, removed, remaining = self.actions.len(), "undo applied");
        self.actions.clone()
    }

    /// Removes a session from membership. Safe to call more than once.
    pub fn leave(&mut self, session_id: SessionId) -> bool {
        let removed = self.sessions.remove(session_id);
        if removed {
            self.touch();
        }
        removed
    }

    /// Returns the current log.
    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Returns the room's membership.
    #[must_use]
    pub const fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Returns the room's membership for broadcasting.
    pub fn sessions_mut(&mut self) -> &mut SessionRegistry {
        &mut self.sessions
    }

    /// Returns `true` once the room has been dropped from the registry.
    ///
    /// A caller that obtained the room before it was retired must look it
    /// up again instead of joining.
    #[must_use]
    pub const fn is_retired(&self) -> bool {
        self.retired
    }

    /// Marks the room as removed from the registry.
    pub fn retire(&mut self) {
        self.retired = true;
    }

    /// Returns a point-in-time summary of the room.
    #[must_use]
    pub fn summary(&self) -> RoomSummary {
        RoomSummary::from(self)
    }

    fn touch(&mut self) {
        self.last_activity_at = Utc::now();
    }
}

/// Lightweight view of a room for the inspection endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSummary {
    /// Room identifier.
    pub room_id: RoomId,
    /// Connected sessions.
    pub session_count: usize,
    /// Entries currently in the log.
    pub action_count: usize,
    /// Complete strokes currently in the log.
    pub stroke_count: usize,
    /// Actions appended since creation, including undone ones.
    pub appended_total: u64,
    /// Undo commands applied since creation.
    pub undo_total: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last join, leave, append, or undo.
    pub last_activity_at: DateTime<Utc>,
}

impl From<&Room> for RoomSummary {
    fn from(room: &Room) -> Self {
        Self {
            room_id: room.room_id.clone(),
            session_count: room.sessions.len(),
            action_count: room.actions.len(),
            stroke_count: stroke_count(&room.actions),
            appended_total: room.appended_total,
            undo_total: room.undo_total,
            created_at: room.created_at,
            last_activity_at: room.last_activity_at,
        }
    }
}
