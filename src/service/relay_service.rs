//! Relay service: room state operations paired with their broadcasts.
//!
//! Every mutation follows the same pattern: look up the room → acquire
//! the room lock → mutate the log → enqueue the resulting frames → release.
//! Enqueueing under the lock is what gives each recipient the frames in
//! log order, and what guarantees a joiner's `reset` precedes any live
//! frame it sees.

use std::sync::Arc;

use super::frames::{ServerMessage, encode_action};
use crate::domain::{
    Action, BroadcastOutcome, OutboundFrame, RoomId, RoomRegistry, RoomSummary, SessionHandle,
    SessionId,
};
use crate::error::RelayError;

/// Orchestration layer for room membership, log mutation, and relay.
#[derive(Debug, Clone)]
pub struct RelayService {
    registry: Arc<RoomRegistry>,
    room_gc_enabled: bool,
}

impl RelayService {
    /// Creates a new `RelayService`.
    ///
    /// With `room_gc_enabled`, a room is dropped as soon as its last
    /// session leaves; otherwise rooms live for the life of the process.
    #[must_use]
    pub const fn new(registry: Arc<RoomRegistry>, room_gc_enabled: bool) -> Self {
        Self {
            registry,
            room_gc_enabled,
        }
    }

    /// Returns a reference to the inner [`RoomRegistry`].
    #[must_use]
    pub const fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Registers a session in its room and queues a `reset` to it.
    ///
    /// The room is created if unseen. Registration and the `reset` happen
    /// in one critical section, so the snapshot is the first frame the
    /// session receives. Returns the snapshot that was sent.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Internal`] if the snapshot cannot be encoded
    /// and [`RelayError::SessionNotJoined`] if it cannot be queued to the
    /// session. The session is not left registered in either case.
    pub async fn join(&self, handle: SessionHandle) -> Result<Vec<Action>, RelayError> {
        let room_id = handle.room_id().clone();
        let session_id = handle.session_id();
        loop {
            let room = self.registry.get_or_create(&room_id).await;
            let mut guard = room.lock().await;
            if guard.is_retired() {
                // Reclaimed between lookup and lock; the next lookup
                // creates a fresh room.
                continue;
            }
            let snapshot = guard.join(handle);
            let frame = match ServerMessage::reset(snapshot.clone()).encode() {
                Ok(frame) => frame,
                Err(err) => {
                    guard.leave(session_id);
                    return Err(err);
                }
            };
            if !guard.sessions_mut().send_to(session_id, &frame) {
                // send_to already evicted the session.
                return Err(RelayError::SessionNotJoined(session_id));
            }
            tracing::info!(
                %room_id,
                %session_id,
                actions = snapshot.len(),
                sessions = guard.sessions().len(),
                "session joined"
            );
            return Ok(snapshot);
        }
    }

    /// Appends actions from `sender` and relays each to the other members.
    ///
    /// The actions are committed and relayed in order within one critical
    /// section; the sender never receives its own frames back.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::RoomNotFound`] or
    /// [`RelayError::SessionNotJoined`] if the sender is no longer a
    /// member, and [`RelayError::Internal`] if a frame cannot be encoded.
    pub async fn append(
        &self,
        room_id: &RoomId,
        sender: SessionId,
        actions: Vec<Action>,
    ) -> Result<BroadcastOutcome, RelayError> {
        let room = self.registry.get(room_id).await?;
        let mut guard = room.lock().await;
        if !guard.sessions().contains(sender) {
            return Err(RelayError::SessionNotJoined(sender));
        }
        let frames = actions
            .iter()
            .map(encode_action)
            .collect::<Result<Vec<_>, _>>()?;

        let mut outcome = BroadcastOutcome::default();
        for (action, frame) in actions.into_iter().zip(frames) {
            tracing::trace!(%room_id, %sender, action = action.type_str(), "action appended");
            guard.append(action);
            let step = guard.sessions_mut().broadcast(&frame, Some(sender));
            merge(&mut outcome, step);
        }
        Ok(outcome)
    }

    /// Applies one undo and sends the resulting `reset` to every member,
    /// the requester included.
    ///
    /// Undo on an empty log is not an error: the (empty) state is still
    /// broadcast.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::RoomNotFound`] or
    /// [`RelayError::SessionNotJoined`] if the requester is no longer a
    /// member, and [`RelayError::Internal`] if the snapshot cannot be
    /// encoded.
    pub async fn undo(
        &self,
        room_id: &RoomId,
        requester: SessionId,
    ) -> Result<(Vec<Action>, BroadcastOutcome), RelayError> {
        let room = self.registry.get(room_id).await?;
        let mut guard = room.lock().await;
        if !guard.sessions().contains(requester) {
            return Err(RelayError::SessionNotJoined(requester));
        }
        let snapshot = guard.undo();
        let frame = ServerMessage::reset(snapshot.clone()).encode()?;
        let outcome = guard.sessions_mut().broadcast_all(&frame);
        tracing::info!(
            %room_id,
            %requester,
            remaining = snapshot.len(),
            delivered = outcome.delivered,
            "undo broadcast"
        );
        Ok((snapshot, outcome))
    }

    /// Deregisters a session. Calling it again is a no-op.
    ///
    /// Returns `true` if the session was still registered.
    pub async fn leave(&self, room_id: &RoomId, session_id: SessionId) -> bool {
        let Ok(room) = self.registry.get(room_id).await else {
            return false;
        };
        let mut guard = room.lock().await;
        let removed = guard.leave(session_id);
        let now_empty = guard.sessions().is_empty();
        drop(guard);

        if removed {
            tracing::info!(%room_id, %session_id, "session left");
        }
        if self.room_gc_enabled && now_empty {
            self.registry.remove_if_empty(room_id).await;
        }
        removed
    }

    /// Delivers `frame` to one member of the room.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::RoomNotFound`] if the room does not exist and
    /// [`RelayError::SessionNotJoined`] if the session is not a member or
    /// was evicted by this delivery.
    pub async fn send_to(
        &self,
        room_id: &RoomId,
        session_id: SessionId,
        frame: &OutboundFrame,
    ) -> Result<(), RelayError> {
        let room = self.registry.get(room_id).await?;
        if room.lock().await.sessions_mut().send_to(session_id, frame) {
            Ok(())
        } else {
            Err(RelayError::SessionNotJoined(session_id))
        }
    }

    /// Returns the summary and current log of an existing room, read
    /// under one lock so the two agree.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::RoomNotFound`] if the room does not exist.
    pub async fn detail(
        &self,
        room_id: &RoomId,
    ) -> Result<(RoomSummary, Vec<Action>), RelayError> {
        let room = self.registry.get(room_id).await?;
        let guard = room.lock().await;
        Ok((guard.summary(), guard.actions().to_vec()))
    }

    /// Returns summaries of all rooms.
    pub async fn list_rooms(&self) -> Vec<RoomSummary> {
        self.registry.list().await
    }
}

fn merge(total: &mut BroadcastOutcome, step: BroadcastOutcome) {
    total.delivered = total.delivered.saturating_add(step.delivered);
    total.evicted.extend(step.evicted);
}
