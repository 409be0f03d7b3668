//! Process-wide directory of live rooms.
//!
//! An explicitly constructed service instance, not a global: callers hold a
//! [`RoomRegistry`] and hand clones of it around. One lock serializes
//! structural mutation of the map; room internals are protected by their
//! own lock, so lookups never block on in-room work.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{Playlist, PlaylistProvider, RoomError, RoomOptions};
use crate::room::{Room, RoomSummary};

/// Directory of live rooms. Cheap to clone; all clones share the same map.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Default)]
pub(crate) struct RegistryInner {
    rooms: Mutex<HashMap<String, Arc<Room>>>,
}

impl RegistryInner {
    /// Remove a room from the map. Idempotent: rooms retire themselves
    /// concurrently with callers also asking for deletion.
    pub(crate) async fn remove(&self, id: &str) {
        if self.rooms.lock().await.remove(id).is_some() {
            tracing::info!("room {} removed from registry", id);
        }
    }
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a room with a fresh unique id.
    pub async fn create_room(
        &self,
        playlist: Playlist,
        opts: RoomOptions,
    ) -> Result<Arc<Room>, RoomError> {
        self.create_room_with_id(Uuid::new_v4().to_string(), playlist, opts)
            .await
    }

    /// Create a room under a caller-chosen id (e.g. derived from the
    /// playlist reference). Rejects empty playlists and ids that already
    /// name a live room.
    pub async fn create_room_with_id(
        &self,
        id: impl Into<String>,
        playlist: Playlist,
        opts: RoomOptions,
    ) -> Result<Arc<Room>, RoomError> {
        let id = id.into();

        if playlist.is_empty() {
            return Err(RoomError::EmptyPlaylist(playlist.id));
        }

        let mut rooms = self.inner.rooms.lock().await;
        if rooms.contains_key(&id) {
            return Err(RoomError::DuplicateRoomId(id));
        }

        let room = Room::new(id.clone(), playlist, opts, Arc::downgrade(&self.inner));
        rooms.insert(id.clone(), Arc::clone(&room));
        tracing::info!(
            "room {} created ({} tracks in playlist {:?})",
            id,
            room.playlist().len(),
            room.playlist().name
        );
        Ok(room)
    }

    /// Resolve a playlist through the catalog collaborator and create a
    /// room from it. A provider failure means the room is not created.
    pub async fn open_room(
        &self,
        provider: &dyn PlaylistProvider,
        reference: &str,
        opts: RoomOptions,
    ) -> Result<Arc<Room>, RoomError> {
        let playlist = provider.playlist(reference).await?;
        self.create_room(playlist, opts).await
    }

    /// Look up a live room.
    pub async fn room(&self, id: &str) -> Result<Arc<Room>, RoomError> {
        self.inner
            .rooms
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| RoomError::RoomNotFound(id.to_string()))
    }

    /// Delete a room. Idempotent; deleting an unknown id is a no-op.
    pub async fn remove_room(&self, id: &str) {
        self.inner.remove(id).await;
    }

    /// Snapshot of all live rooms. The registry lock is released before
    /// the per-room locks are taken.
    pub async fn rooms(&self) -> Vec<RoomSummary> {
        let rooms: Vec<Arc<Room>> = self.inner.rooms.lock().await.values().cloned().collect();

        let mut summaries = Vec::with_capacity(rooms.len());
        for room in rooms {
            summaries.push(room.summary().await);
        }
        summaries
    }
}
