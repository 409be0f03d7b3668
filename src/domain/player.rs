//! Players and their per-track guess state.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How well a single field (title or one artist) has been guessed.
///
/// Totally ordered so that monotonic updates are a `max`: a field may move
/// `Invalid -> Partial -> Valid` but never back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MatchState {
    #[default]
    Invalid,
    Partial,
    Valid,
}

impl MatchState {
    pub fn is_valid(self) -> bool {
        self == MatchState::Valid
    }
}

/// One player's standing for one played track.
///
/// Artists are keyed by their normalized name, matching the keys the guess
/// matcher scores against. Both the states and `score` only ever improve
/// across repeated guesses.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GuessResult {
    pub title: MatchState,
    pub artists: BTreeMap<String, MatchState>,
    /// Best cumulative score this player has reached for this track.
    pub score: f64,
}

impl GuessResult {
    /// Fresh all-Invalid result for a track with the given normalized
    /// artist names.
    pub fn seeded(artist_keys: impl IntoIterator<Item = String>) -> Self {
        Self {
            title: MatchState::Invalid,
            artists: artist_keys
                .into_iter()
                .map(|key| (key, MatchState::Invalid))
                .collect(),
            score: 0.0,
        }
    }
}

/// A player inside one room.
///
/// Created on the first join for an identity and retained across reconnects
/// so history and score survive. `nonce` increments on every connect; a
/// disconnect carrying an older nonce is a stale signal from a superseded
/// connection and must be ignored.
#[derive(Clone, Debug)]
pub struct Player {
    pub id: String,
    pub name: String,
    /// Played-track name -> this player's result for it. Back-filled on
    /// join/reconnect so an entry exists for every played track.
    pub guesses: HashMap<String, GuessResult>,
    /// Cumulative score across the whole room.
    pub score: f64,
    /// Connection epoch, bumped on every connect.
    pub nonce: u64,
    /// Position in which this player first joined; leaderboard tie-break.
    pub join_order: usize,
    pub joined_at: DateTime<Utc>,
}

impl Player {
    pub fn new(id: impl Into<String>, name: impl Into<String>, join_order: usize) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            guesses: HashMap::new(),
            score: 0.0,
            nonce: 0,
            join_order,
            joined_at: Utc::now(),
        }
    }
}

/// One row of the room leaderboard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_state_ordering_supports_monotonic_updates() {
        // given:
        let current = MatchState::Partial;

        // when: a worse and a better observation come in
        let after_worse = current.max(MatchState::Invalid);
        let after_better = current.max(MatchState::Valid);

        // then:
        assert_eq!(after_worse, MatchState::Partial);
        assert_eq!(after_better, MatchState::Valid);
    }

    #[test]
    fn seeded_result_starts_all_invalid_with_zero_score() {
        // given:
        let result = GuessResult::seeded(["daft punk".to_string(), "pharrell".to_string()]);

        // then:
        assert_eq!(result.title, MatchState::Invalid);
        assert_eq!(result.artists.len(), 2);
        assert!(result.artists.values().all(|s| *s == MatchState::Invalid));
        assert_eq!(result.score, 0.0);
    }
}
