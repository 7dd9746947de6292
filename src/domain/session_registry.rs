//! Per-room session membership with broadcast and directed send.
//!
//! Each [`SessionHandle`] owns the sending half of a bounded channel that a
//! per-connection writer task drains into the socket. Enqueueing never
//! awaits: a closed or full queue counts as a failed delivery and the
//! recipient is evicted, which drops its sender and lets its writer task
//! wind down.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use super::{RoomId, SessionId};

/// A pre-serialized outbound text frame, shared across recipients.
pub type OutboundFrame = Arc<str>;

/// One live connection registered in a room.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    session_id: SessionId,
    room_id: RoomId,
    sender: mpsc::Sender<OutboundFrame>,
}

impl SessionHandle {
    /// Creates a handle for `session_id` in `room_id`.
    #[must_use]
    pub const fn new(
        session_id: SessionId,
        room_id: RoomId,
        sender: mpsc::Sender<OutboundFrame>,
    ) -> Self {
        Self {
            session_id,
            room_id,
            sender,
        }
    }

    /// Returns the session identifier.
    #[must_use]
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Returns the room this session belongs to.
    #[must_use]
    pub const fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Enqueues a frame without waiting.
    ///
    /// # Errors
    ///
    /// Returns the channel error if the queue is full or the writer side
    /// has gone away.
    pub fn try_send(
        &self,
        frame: OutboundFrame,
    ) -> Result<(), mpsc::error::TrySendError<OutboundFrame>> {
        self.sender.try_send(frame)
    }
}

/// Result of a broadcast.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// Number of sessions the frame was enqueued for.
    pub delivered: usize,
    /// Sessions whose delivery failed and which were removed.
    pub evicted: Vec<SessionId>,
}

/// Membership of a single room.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, SessionHandle>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session, replacing any handle with the same id.
    pub fn add(&mut self, handle: SessionHandle) {
        self.sessions.insert(handle.session_id(), handle);
    }

    /// Removes a session. Returns `false` if it was not registered.
    pub fn remove(&mut self, session_id: SessionId) -> bool {
        self.sessions.remove(&session_id).is_some()
    }

    /// Returns `true` if the session is registered.
    #[must_use]
    pub fn contains(&self, session_id: SessionId) -> bool {
        self.sessions.contains_key(&session_id)
    }

    /// Returns the number of registered sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no session is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Delivers `frame` to every session except `exclude`.
    ///
    /// A failure for one recipient never stops delivery to the others; the
    /// failing recipient is evicted.
    pub fn broadcast(
        &mut self,
        frame: &OutboundFrame,
        exclude: Option<SessionId>,
    ) -> BroadcastOutcome {
        let mut outcome = BroadcastOutcome::default();
        for (session_id, handle) in &self.sessions {
            if Some(*session_id) == exclude {
                continue;
            }
            match handle.try_send(Arc::clone(frame)) {
                Ok(()) => outcome.delivered = outcome.delivered.saturating_add(1),
                Err(err) => {
                    tracing::warn!(
                        room_id = %handle.room_id(),
                        %session_id,
                        error = %err,
                        "evicting session after failed delivery"
                    );
                    outcome.evicted.push(*session_id);
                }
            }
        }
        for session_id in &outcome.evicted {
            self.sessions.remove(session_id);
        }
        outcome
    }

    /// Delivers `frame` to every registered session.
    pub fn broadcast_all(&mut self, frame: &OutboundFrame) -> BroadcastOutcome {
        self.broadcast(frame, None)
    }

    /// Delivers `frame` to a single session.
    ///
    /// Returns `false` if the session is unknown or the delivery failed; in
    /// the latter case the session is evicted.
    pub fn send_to(&mut self, session_id: SessionId, frame: &OutboundFrame) -> bool {
        let Some(handle) = self.sessions.get(&session_id) else {
            return false;
        };
        if let Err(err) = handle.try_send(Arc::clone(frame)) {
            tracing::warn!(
                room_id = %handle.room_id(),
                %session_id,
                error = %err,
                "evicting session after failed directed send"
            );
            self.sessions.remove(&session_id);
            return false;
        }
        true
    }
}
