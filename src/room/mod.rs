//! One live game session: players, the rotation clock and scoring.

mod event;

pub use event::{Connection, RoomEvent};

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::Serialize;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::time::MissedTickBehavior;

use crate::domain::{
    GuessResult, LeaderboardEntry, LeaveOutcome, Player, Playlist, RoomError, RoomOptions, Track,
};
use crate::matching::{self, FieldCompetition};
use crate::registry::RegistryInner;

/// Snapshot view of a room for listings.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoomSummary {
    pub id: String,
    pub playlist_name: String,
    pub players: usize,
    pub connections: usize,
    pub tracks_played: usize,
    pub created_at: DateTime<Utc>,
}

/// The state machine for one game session.
///
/// A room is created by the [`RoomRegistry`], starts its rotation loop on
/// the first join, and retires itself (stops the loop, removes itself from
/// the registry) when its open-connection count returns to zero. Rooms are
/// always handled as `Arc<Room>`; all mutable state sits behind one
/// internal lock.
///
/// [`RoomRegistry`]: crate::registry::RoomRegistry
pub struct Room {
    id: String,
    playlist: Playlist,
    opts: RoomOptions,
    created_at: DateTime<Utc>,
    /// Back-reference for self-retirement. Weak so a retired registry does
    /// not keep rooms alive and vice versa.
    registry: Weak<RegistryInner>,
    /// Self-reference handed to the rotation task on spawn.
    weak_self: Weak<Room>,
    stop: watch::Sender<bool>,
    /// Receiver created at construction so a stop sent before the rotation
    /// loop spawns is still observed.
    stop_rx: watch::Receiver<bool>,
    inner: Mutex<RoomInner>,
}

#[derive(Default)]
struct RoomInner {
    players: HashMap<String, Player>,
    /// Append-only, in reveal order. The last entry is the current track.
    played: Vec<Track>,
    /// Open connections; distinct from the player count since one player
    /// may hold several live connections.
    connections: usize,
    /// Per-connection bounded event queues, keyed by (identity, nonce).
    listeners: HashMap<(String, u64), mpsc::Sender<RoomEvent>>,
    next_join_order: usize,
    rotation_started: bool,
}

impl Room {
    pub(crate) fn new(
        id: String,
        playlist: Playlist,
        opts: RoomOptions,
        registry: Weak<RegistryInner>,
    ) -> Arc<Self> {
        let (stop, stop_rx) = watch::channel(false);
        Arc::new_cyclic(|weak_self| Self {
            id,
            playlist,
            opts,
            created_at: Utc::now(),
            registry,
            weak_self: weak_self.clone(),
            stop,
            stop_rx,
            inner: Mutex::new(RoomInner::default()),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn options(&self) -> &RoomOptions {
        &self.opts
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Open a connection for `identity`, creating the player on first join.
    ///
    /// A reconnecting identity keeps its score and history and only gets
    /// missing per-track results back-filled. Every call bumps the player's
    /// nonce and registers a fresh bounded event queue; the first join ever
    /// starts the rotation loop.
    ///
    /// Fails with [`RoomError::RoomFull`] when a *new* identity would
    /// exceed the configured maximum of players.
    pub async fn join(&self, identity: &str, name: &str) -> Result<Connection, RoomError> {
        let mut inner = self.inner.lock().await;

        if !inner.players.contains_key(identity) && inner.players.len() >= self.opts.max_players {
            return Err(RoomError::RoomFull {
                max_players: self.opts.max_players,
            });
        }

        let RoomInner {
            players,
            played,
            connections,
            listeners,
            next_join_order,
            rotation_started,
        } = &mut *inner;

        let player = players.entry(identity.to_string()).or_insert_with(|| {
            let player = Player::new(identity, name, *next_join_order);
            *next_join_order += 1;
            player
        });

        // Back-fill results for tracks played while this identity was away
        // (or all of them, for a brand-new player).
        for track in played.iter() {
            player
                .guesses
                .entry(track.name.clone())
                .or_insert_with(|| matching::seed_result(track));
        }

        player.nonce += 1;
        let nonce = player.nonce;
        *connections += 1;

        let (queue, events) = mpsc::channel(self.opts.max_players.max(1));
        listeners.insert((identity.to_string(), nonce), queue);

        let start_rotation = !*rotation_started;
        *rotation_started = true;
        drop(inner);

        tracing::info!("player {} joined room {} (nonce {})", identity, self.id, nonce);

        if start_rotation {
            if let Some(room) = self.weak_self.upgrade() {
                tokio::spawn(room.run_rotation());
            }
        }

        Ok(Connection { nonce, events })
    }

    /// Close the connection identified by `(identity, nonce)`.
    ///
    /// A nonce older than the player's current one is a stale signal from a
    /// superseded connection: its queue still closes and the connection
    /// count still drops, but the player is left untouched. A signal whose
    /// nonce names no live queue at all (a duplicated disconnect, or a
    /// nonce that was never issued) is a stale no-op and does not touch the
    /// count, so `leave` is idempotent. When the last open connection goes,
    /// the rotation loop is stopped and the room asks the registry to
    /// delete it.
    pub async fn leave(&self, identity: &str, nonce: u64) -> Result<LeaveOutcome, RoomError> {
        let outcome;
        {
            let mut inner = self.inner.lock().await;

            let current_nonce = inner
                .players
                .get(identity)
                .map(|player| player.nonce)
                .ok_or_else(|| RoomError::UnknownPlayer(identity.to_string()))?;

            // Only a signal that closes a live queue counts against the
            // open-connection total.
            if inner
                .listeners
                .remove(&(identity.to_string(), nonce))
                .is_none()
            {
                tracing::debug!(
                    "ignoring disconnect without a live connection for player {} in room {} (nonce {})",
                    identity,
                    self.id,
                    nonce
                );
                return Ok(LeaveOutcome::Stale);
            }

            outcome = if current_nonce == nonce {
                LeaveOutcome::Left
            } else {
                LeaveOutcome::Stale
            };
            inner.connections = inner.connections.saturating_sub(1);

            match outcome {
                LeaveOutcome::Left => {
                    tracing::info!("player {} left room {}", identity, self.id);
                }
                LeaveOutcome::Stale => {
                    tracing::debug!(
                        "ignoring stale disconnect for player {} in room {} (nonce {})",
                        identity,
                        self.id,
                        nonce
                    );
                }
            }

            if inner.connections > 0 {
                return Ok(outcome);
            }
        }

        // Last connection gone: stop the clock and retire the room.
        tracing::info!("room {} is empty, removing it", self.id);
        let _ = self.stop.send(true);
        self.retire().await;
        Ok(outcome)
    }

    /// Score a guess from `identity` against the most recently revealed
    /// track.
    ///
    /// On a strictly positive score delta the room-wide leaderboard is
    /// recomputed and published once per open connection.
    pub async fn submit_guess(&self, identity: &str, text: &str) -> Result<GuessResult, RoomError> {
        let mut inner = self.inner.lock().await;

        let Some(track) = inner.played.last().cloned() else {
            return Err(RoomError::NoTrackPlayed);
        };

        // Competition snapshot of the other players, for the finder bonus.
        let mut rivals = FieldCompetition::default();
        for (id, other) in &inner.players {
            if id == identity {
                continue;
            }
            let Some(result) = other.guesses.get(&track.name) else {
                continue;
            };
            if result.title.is_valid() {
                rivals.title_valid += 1;
            }
            for (artist, state) in &result.artists {
                if state.is_valid() {
                    *rivals.artists_valid.entry(artist.clone()).or_default() += 1;
                }
            }
        }

        let player = inner
            .players
            .get_mut(identity)
            .ok_or_else(|| RoomError::UnknownPlayer(identity.to_string()))?;

        let prior = player
            .guesses
            .entry(track.name.clone())
            .or_insert_with(|| matching::seed_result(&track))
            .clone();
        let (result, delta) = matching::evaluate(text, &track, &prior, &self.opts, &rivals);
        player.guesses.insert(track.name.clone(), result.clone());

        if delta > 0.0 {
            player.score += delta;
            tracing::debug!(
                "room {}: player {} scored +{:.1} ({:.1} total)",
                self.id,
                identity,
                delta,
                player.score
            );
            let board = Self::leaderboard_of(&inner.players);
            Self::publish(&inner.listeners, RoomEvent::LeaderboardUpdated(board)).await;
        }

        Ok(result)
    }

    /// Current leaderboard: descending score, ties broken by join order.
    pub async fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let inner = self.inner.lock().await;
        Self::leaderboard_of(&inner.players)
    }

    /// Tracks revealed so far, in reveal order.
    pub async fn played_tracks(&self) -> Vec<Track> {
        self.inner.lock().await.played.clone()
    }

    pub async fn summary(&self) -> RoomSummary {
        let inner = self.inner.lock().await;
        RoomSummary {
            id: self.id.clone(),
            playlist_name: self.playlist.name.clone(),
            players: inner.players.len(),
            connections: inner.connections,
            tracks_played: inner.played.len(),
            created_at: self.created_at,
        }
    }

    /// The rotation loop: one task per room, alive for its whole Running
    /// phase. The first tick fires immediately, so the first track reveals
    /// without waiting a full interval.
    async fn run_rotation(self: Arc<Self>) {
        tracing::info!(
            "room {}: rotation started ({:?} per track, {} tracks)",
            self.id,
            self.opts.track_duration,
            self.playlist.len()
        );

        let mut ticker = tokio::time::interval(self.opts.track_duration);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut stop_rx = self.stop_rx.clone();

        for _ in 0..self.playlist.len() {
            if *stop_rx.borrow_and_update() {
                break;
            }
            tokio::select! {
                _ = stop_rx.changed() => break,
                _ = ticker.tick() => {
                    if !self.reveal_next_track().await {
                        break;
                    }
                }
            }
        }

        self.shutdown().await;
    }

    /// Pick a uniformly random unplayed track, append it to the played
    /// list, seed every player's result for it and broadcast the reveal.
    /// All of that is atomic under the room lock.
    async fn reveal_next_track(&self) -> bool {
        let mut inner = self.inner.lock().await;

        let track = {
            let already_played: HashSet<&str> =
                inner.played.iter().map(|t| t.name.as_str()).collect();
            let remaining: Vec<&Track> = self
                .playlist
                .tracks
                .iter()
                .filter(|t| !already_played.contains(t.name.as_str()))
                .collect();
            match remaining.choose(&mut rand::thread_rng()) {
                Some(track) => (*track).clone(),
                None => {
                    tracing::warn!("room {}: no unplayed track left, stopping", self.id);
                    return false;
                }
            }
        };

        inner.played.push(track.clone());

        let seeded = matching::seed_result(&track);
        for player in inner.players.values_mut() {
            player.guesses.insert(track.name.clone(), seeded.clone());
        }

        tracing::info!(
            "room {}: revealing {:?} ({}/{})",
            self.id,
            track.name,
            inner.played.len(),
            self.playlist.len()
        );
        Self::publish(&inner.listeners, RoomEvent::TrackRevealed(track)).await;
        true
    }

    /// Loop exit path: force-disconnect every remaining listener and ask
    /// the registry to delete this room.
    async fn shutdown(&self) {
        {
            let mut inner = self.inner.lock().await;
            if !inner.listeners.is_empty() {
                tracing::info!(
                    "room {}: disconnecting {} remaining connection(s)",
                    self.id,
                    inner.listeners.len()
                );
            }
            inner.listeners.clear();
            inner.connections = 0;
        }
        tracing::info!("room {}: rotation finished", self.id);
        self.retire().await;
    }

    async fn retire(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.id).await;
        }
    }

    /// Deliver one event to every open connection. A closed queue means the
    /// listener's transport already died; skip it, the leave path cleans up.
    async fn publish(listeners: &HashMap<(String, u64), mpsc::Sender<RoomEvent>>, event: RoomEvent) {
        for ((identity, nonce), queue) in listeners {
            if queue.send(event.clone()).await.is_err() {
                tracing::warn!(
                    "dropping event for closed connection {}#{}",
                    identity,
                    nonce
                );
            }
        }
    }

    fn leaderboard_of(players: &HashMap<String, Player>) -> Vec<LeaderboardEntry> {
        let mut ranked: Vec<&Player> = players.values().collect();
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.join_order.cmp(&b.join_order))
        });
        ranked
            .into_iter()
            .map(|p| LeaderboardEntry {
                name: p.name.clone(),
                score: p.score,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Artist, MatchState};

    fn test_playlist(track_names: &[&str]) -> Playlist {
        Playlist {
            id: "pl1".to_string(),
            name: "Test Hits".to_string(),
            tracks: track_names
                .iter()
                .enumerate()
                .map(|(i, name)| Track {
                    id: format!("t{i}"),
                    name: name.to_string(),
                    artists: vec![Artist::new("Imagine Dragons")],
                    preview_url: String::new(),
                    image_url: String::new(),
                })
                .collect(),
        }
    }

    fn detached_room(playlist: Playlist, opts: RoomOptions) -> Arc<Room> {
        Room::new("room1".to_string(), playlist, opts, Weak::new())
    }

    #[tokio::test]
    async fn guess_before_any_reveal_is_an_invalid_state() {
        // given: a room with a player but no started rotation
        let room = detached_room(test_playlist(&["Believer"]), RoomOptions::default());
        room.inner
            .lock()
            .await
            .players
            .insert("p1".to_string(), Player::new("p1", "Alice", 0));

        // when:
        let result = room.submit_guess("p1", "believer").await;

        // then:
        assert_eq!(result, Err(RoomError::NoTrackPlayed));
    }

    #[tokio::test]
    async fn guess_from_an_unknown_identity_is_rejected() {
        // given: a room with one revealed track
        let room = detached_room(test_playlist(&["Believer"]), RoomOptions::default());
        assert!(room.reveal_next_track().await);

        // when:
        let result = room.submit_guess("ghost", "believer").await;

        // then:
        assert_eq!(result, Err(RoomError::UnknownPlayer("ghost".to_string())));
    }

    #[tokio::test]
    async fn join_is_capped_at_max_players_for_new_identities_only() {
        // given:
        let opts = RoomOptions {
            max_players: 1,
            ..RoomOptions::default()
        };
        let room = detached_room(test_playlist(&["Believer"]), opts);
        let first = room.join("p1", "Alice").await;
        assert!(first.is_ok());

        // when: a second identity and a reconnect of the first
        let second = room.join("p2", "Bob").await;
        let reconnect = room.join("p1", "Alice").await;

        // then:
        assert_eq!(
            second.err(),
            Some(RoomError::RoomFull { max_players: 1 })
        );
        assert!(reconnect.is_ok());
    }

    #[tokio::test]
    async fn reveal_seeds_every_player_and_never_repeats_a_track() {
        // given: two players, three tracks
        let room = detached_room(
            test_playlist(&["One", "Two", "Three"]),
            RoomOptions::default(),
        );
        {
            let mut inner = room.inner.lock().await;
            inner.players.insert("p1".to_string(), Player::new("p1", "Alice", 0));
            inner.players.insert("p2".to_string(), Player::new("p2", "Bob", 1));
        }

        // when: revealing until the playlist is exhausted
        for _ in 0..3 {
            assert!(room.reveal_next_track().await);
        }
        let exhausted = room.reveal_next_track().await;

        // then: all tracks played exactly once, everyone seeded
        assert!(!exhausted);
        let inner = room.inner.lock().await;
        assert_eq!(inner.played.len(), 3);
        let names: HashSet<&str> = inner.played.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names.len(), 3);
        for player in inner.players.values() {
            assert_eq!(player.guesses.len(), 3);
            for result in player.guesses.values() {
                assert_eq!(result.title, MatchState::Invalid);
            }
        }
    }

    #[tokio::test]
    async fn late_joiner_is_backfilled_for_already_played_tracks() {
        // given: two tracks already revealed
        let room = detached_room(test_playlist(&["One", "Two"]), RoomOptions::default());
        assert!(room.reveal_next_track().await);
        assert!(room.reveal_next_track().await);

        // when:
        let connection = room.join("late", "Carol").await.unwrap();

        // then: zeroed results exist for every played track
        assert_eq!(connection.nonce, 1);
        let inner = room.inner.lock().await;
        let player = &inner.players["late"];
        assert_eq!(player.guesses.len(), 2);
        assert!(player.guesses.values().all(|g| g.score == 0.0));
    }

    #[tokio::test]
    async fn stale_nonce_leave_keeps_the_player() {
        // given: a player who reconnected, superseding the first connection
        let room = detached_room(test_playlist(&["Believer"]), RoomOptions::default());
        let first = room.join("p1", "Alice").await.unwrap();
        let second = room.join("p1", "Alice").await.unwrap();
        assert_eq!(first.nonce, 1);
        assert_eq!(second.nonce, 2);

        // when: the superseded connection's disconnect arrives late
        let outcome = room.leave("p1", first.nonce).await.unwrap();

        // then: no-op for the player, connection count still drops
        assert_eq!(outcome, LeaveOutcome::Stale);
        let inner = room.inner.lock().await;
        assert!(inner.players.contains_key("p1"));
        assert_eq!(inner.connections, 1);
    }

    #[tokio::test]
    async fn duplicate_or_unissued_disconnects_leave_the_count_alone() {
        // given: two players, two live connections
        let room = detached_room(test_playlist(&["Believer"]), RoomOptions::default());
        let alice = room.join("p1", "Alice").await.unwrap();
        let _bob = room.join("p2", "Bob").await.unwrap();

        // when: Alice leaves, then the same disconnect is replayed and a
        // never-issued nonce arrives
        assert_eq!(room.leave("p1", alice.nonce).await, Ok(LeaveOutcome::Left));
        let replayed = room.leave("p1", alice.nonce).await.unwrap();
        let unissued = room.leave("p2", 99).await.unwrap();

        // then: both are no-ops and Bob's connection is still accounted for
        assert_eq!(replayed, LeaveOutcome::Stale);
        assert_eq!(unissued, LeaveOutcome::Stale);
        let inner = room.inner.lock().await;
        assert_eq!(inner.connections, 1);
        assert!(inner.listeners.contains_key(&("p2".to_string(), 1)));
    }

    #[tokio::test]
    async fn leave_for_an_unknown_identity_is_not_found() {
        // given:
        let room = detached_room(test_playlist(&["Believer"]), RoomOptions::default());

        // when:
        let result = room.leave("ghost", 1).await;

        // then:
        assert_eq!(result, Err(RoomError::UnknownPlayer("ghost".to_string())));
    }

    #[tokio::test]
    async fn leaderboard_sorts_by_score_then_join_order() {
        // given: tied and untied players
        let room = detached_room(test_playlist(&["Believer"]), RoomOptions::default());
        {
            let mut inner = room.inner.lock().await;
            let mut alice = Player::new("p1", "Alice", 0);
            alice.score = 100.0;
            let mut bob = Player::new("p2", "Bob", 1);
            bob.score = 250.0;
            let mut carol = Player::new("p3", "Carol", 2);
            carol.score = 100.0;
            inner.players.insert("p1".to_string(), alice);
            inner.players.insert("p2".to_string(), bob);
            inner.players.insert("p3".to_string(), carol);
        }

        // when:
        let board = room.leaderboard().await;

        // then: descending score, ties by join order
        let names: Vec<&str> = board.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Alice", "Carol"]);
    }
}
