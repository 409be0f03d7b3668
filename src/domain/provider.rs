//! Playlist acquisition seam.
//!
//! The engine never talks to a music catalog itself; it receives playlists
//! that are already fully resolved. This trait is the contract a catalog
//! client (or a test double) implements.

use async_trait::async_trait;

use super::{Playlist, PlaylistError};

/// Resolves an external playlist reference into a full [`Playlist`].
///
/// A failure here means "room cannot be created", never an in-room runtime
/// error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaylistProvider: Send + Sync {
    /// Fetch the playlist behind `reference`, with all tracks and artists
    /// resolved.
    async fn playlist(&self, reference: &str) -> Result<Playlist, PlaylistError>;
}
