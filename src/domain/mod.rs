//! Domain model for the game engine.
//!
//! Everything in this layer is plain data plus the invariants that hold it
//! together. The concurrency machinery lives in [`crate::room`] and
//! [`crate::registry`]; the matching algorithms live in [`crate::matching`].

mod error;
mod options;
mod player;
mod provider;
mod track;

pub use error::{LeaveOutcome, PlaylistError, RoomError};
pub use options::RoomOptions;
pub use player::{GuessResult, LeaderboardEntry, MatchState, Player};
pub use provider::PlaylistProvider;
pub use track::{Artist, Playlist, Track};

#[cfg(test)]
pub use provider::MockPlaylistProvider;
