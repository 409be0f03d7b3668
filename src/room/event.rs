//! Typed events a room pushes to its listeners.
//!
//! The engine hands structured values to whatever delivery mechanism is
//! wired in; it never formats wire bytes itself.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::domain::{LeaderboardEntry, Track};

/// An event published on a connection's queue.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum RoomEvent {
    /// The rotation loop revealed a new current track.
    TrackRevealed(Track),
    /// A score changed; full leaderboard, best first.
    LeaderboardUpdated(Vec<LeaderboardEntry>),
}

/// A live connection handle returned by [`Room::join`].
///
/// Holds the connection's epoch nonce (required to leave) and the receiving
/// end of its bounded event queue. Dropping the receiver without leaving is
/// a transport failure; the room keeps counting the connection until
/// [`Room::leave`] is called.
///
/// [`Room::join`]: super::Room::join
/// [`Room::leave`]: super::Room::leave
#[derive(Debug)]
pub struct Connection {
    /// Epoch to present back on leave. Stale values are ignored there.
    pub nonce: u64,
    /// This connection's private event stream.
    pub events: mpsc::Receiver<RoomEvent>,
}
