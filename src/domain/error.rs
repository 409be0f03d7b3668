//! Typed failures surfaced by the engine.

use thiserror::Error;

/// Errors returned by room and registry operations.
///
/// None of these abort the process; they are returned to the caller that
/// triggered the offending operation.
#[derive(Debug, Error, PartialEq)]
pub enum RoomError {
    /// No live room with this id.
    #[error("room {0} not found")]
    RoomNotFound(String),

    /// The identity is not a player of the addressed room.
    #[error("player {0} is not in this room")]
    UnknownPlayer(String),

    /// A guess arrived before the rotation loop revealed any track.
    #[error("no track has been played yet")]
    NoTrackPlayed,

    /// A room cannot be created from a playlist with zero tracks.
    #[error("playlist {0} has no tracks")]
    EmptyPlaylist(String),

    /// The room already holds its configured maximum of players.
    #[error("room is full ({max_players} players)")]
    RoomFull { max_players: usize },

    /// A caller-chosen room id collides with a live room.
    #[error("room {0} already exists")]
    DuplicateRoomId(String),

    /// The playlist collaborator failed; the room was not created.
    #[error(transparent)]
    Playlist(#[from] PlaylistError),
}

/// Failures of the external playlist catalog collaborator.
#[derive(Debug, Error, PartialEq)]
pub enum PlaylistError {
    #[error("playlist {0} not found")]
    NotFound(String),

    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// What a leave call actually did.
///
/// A stale nonce is an expected race (a superseded connection's disconnect
/// arriving late), so it is reported as an outcome rather than an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The connection was the player's current one.
    Left,
    /// The nonce was outdated; the player was left untouched.
    Stale,
}
