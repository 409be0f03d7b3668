//! Per-room configuration.

use std::time::Duration;

/// Options a room is created with. Immutable after creation.
#[derive(Clone, Debug, PartialEq)]
pub struct RoomOptions {
    /// How long a track stays current before the rotation loop advances.
    pub track_duration: Duration,
    /// Similarity at or above this counts as a full match.
    pub validity_threshold: f64,
    /// Similarity at or above this (but below validity) counts as partial.
    pub partial_threshold: f64,
    /// Maximum number of distinct players; also sizes each connection's
    /// event queue.
    pub max_players: usize,
    /// Flat credit awarded for a fully matched field.
    pub correct_credit: f64,
    /// First-finder bonus schedule, indexed by how many other players were
    /// already Valid on the same field. Empty past the last tier means zero.
    pub finder_bonuses: Vec<f64>,
}

impl Default for RoomOptions {
    fn default() -> Self {
        Self {
            track_duration: Duration::from_secs(30),
            validity_threshold: 85.0,
            partial_threshold: 70.0,
            max_players: 16,
            correct_credit: 100.0,
            finder_bonuses: vec![50.0, 25.0, 10.0],
        }
    }
}

impl RoomOptions {
    /// Bonus for finding a field when `already_valid` other players got
    /// there first.
    pub fn finder_bonus(&self, already_valid: usize) -> f64 {
        self.finder_bonuses.get(already_valid).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finder_bonus_follows_the_schedule_then_drops_to_zero() {
        // given:
        let opts = RoomOptions::default();

        // then:
        assert_eq!(opts.finder_bonus(0), 50.0);
        assert_eq!(opts.finder_bonus(1), 25.0);
        assert_eq!(opts.finder_bonus(2), 10.0);
        assert_eq!(opts.finder_bonus(3), 0.0);
        assert_eq!(opts.finder_bonus(100), 0.0);
    }

    #[test]
    fn empty_schedule_means_no_bonus_at_all() {
        // given:
        let opts = RoomOptions {
            finder_bonuses: vec![],
            ..RoomOptions::default()
        };

        // then:
        assert_eq!(opts.finder_bonus(0), 0.0);
    }
}
