//! Concurrent room storage with per-room locking.
//!
//! [`RoomRegistry`] maps room identifiers to rooms. The outer map sits
//! behind a [`tokio::sync::RwLock`] that is only held for lookup, creation,
//! and removal; each room is individually protected by a
//! [`tokio::sync::Mutex`] so that log mutations within one room are
//! serialized while different rooms proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use super::room::{Room, RoomSummary};
use super::RoomId;
use crate::error::RelayError;

/// Shared handle to one room.
pub type RoomHandle = Arc<Mutex<Room>>;

/// Central store for all rooms.
///
/// # Concurrency
///
/// - Lookups of existing rooms only take the outer read lock.
/// - Operations on the same room are serialized by the room mutex.
/// - Operations on different rooms never contend past the lookup.
/// - Nothing holding a room mutex ever waits on the outer lock.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomId, RoomHandle>>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the room for `room_id`, creating it empty if unseen.
    pub async fn get_or_create(&self, room_id: &RoomId) -> RoomHandle {
        if let Some(room) = self.rooms.read().await.get(room_id) {
            return Arc::clone(room);
        }
        let mut map = self.rooms.write().await;
        let room = map.entry(room_id.clone()).or_insert_with(|| {
            tracing::info!(%room_id, "room created");
            Arc::new(Mutex::new(Room::new(room_id.clone())))
        });
        Arc::clone(room)
    }

    /// Returns an existing room without creating it.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::RoomNotFound`] if no room with the given id
    /// exists.
    pub async fn get(&self, room_id: &RoomId) -> Result<RoomHandle, RelayError> {
        let map = self.rooms.read().await;
        map.get(room_id)
            .cloned()
            .ok_or_else(|| RelayError::RoomNotFound(room_id.clone()))
    }

    /// Drops the room if it has no sessions left.
    ///
    /// The room is marked retired before it leaves the map so that a
    /// concurrent joiner still holding the old handle retries against a
    /// fresh room. Returns `true` if the room was removed.
    pub async fn remove_if_empty(&self, room_id: &RoomId) -> bool {
        let mut map = self.rooms.write().await;
        let Some(handle) = map.get(room_id).cloned() else {
            return false;
        };
        let mut room = handle.lock().await;
        if !room.sessions().is_empty() {
            return false;
        }
        room.retire();
        drop(room);
        map.remove(room_id);
        tracing::info!(%room_id, "empty room reclaimed");
        true
    }

    /// Returns summaries of all rooms, sorted by room id.
    pub async fn list(&self) -> Vec<RoomSummary> {
        let map = self.rooms.read().await;
        let mut summaries = Vec::with_capacity(map.len());
        for room in map.values() {
            summaries.push(room.lock().await.summary());
        }
        summaries.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        summaries
    }

    /// Returns the number of rooms.
    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Returns `true` if there are no rooms.
    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}
