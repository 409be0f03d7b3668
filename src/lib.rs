//! Room coordination and scoring engine for a real-time multiplayer
//! "guess the song" party game.
//!
//! A [`registry::RoomRegistry`] creates rooms from resolved playlists; each
//! [`room::Room`] drives its own track-rotation loop, manages concurrent
//! join/leave/reconnect, scores free-text guesses with fuzzy matching and
//! pushes typed [`room::RoomEvent`]s onto per-connection queues. Transport,
//! catalog access, persistence and rendering are external collaborators.

// layers
pub mod domain;
pub mod matching;
pub mod registry;
pub mod room;

// shared library
pub mod common;

pub use registry::RoomRegistry;
pub use room::{Connection, Room, RoomEvent, RoomSummary};
