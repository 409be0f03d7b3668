//! Catalog model: tracks, artists and playlists.
//!
//! These values arrive fully resolved from a [`PlaylistProvider`] and are
//! immutable for the lifetime of a room.
//!
//! [`PlaylistProvider`]: super::PlaylistProvider

use serde::{Deserialize, Serialize};

/// A performing artist on a track.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub name: String,
}

impl Artist {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// One playable track of a playlist.
///
/// `preview_url` and `image_url` are opaque references owned by the catalog;
/// the engine only forwards them to listeners inside reveal events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<Artist>,
    pub preview_url: String,
    pub image_url: String,
}

/// An ordered, non-empty sequence of tracks.
///
/// Emptiness is checked at room creation, not here, so that providers can
/// still hand back what the catalog returned and let the registry reject it
/// with a typed error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub tracks: Vec<Track>,
}

impl Playlist {
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }
}
