//! Guess evaluation against the current track.

use std::collections::HashMap;

use crate::domain::{GuessResult, MatchState, RoomOptions, Track};

use super::{normalize, similarity};

/// Every contiguous window of the token sequence, joined with single spaces.
///
/// `[a, b, c]` yields `[a, b, c, "a b", "b c", "a b c"]`, so one guess like
/// "imagine dragons believer" can match an artist name and a title at the
/// same time.
pub fn token_windows(tokens: &[&str]) -> Vec<String> {
    let mut windows = Vec::with_capacity(tokens.len() * (tokens.len() + 1) / 2);

    for length in 1..=tokens.len() {
        for start in 0..=tokens.len() - length {
            windows.push(tokens[start..start + length].join(" "));
        }
    }

    windows
}

/// Fresh all-Invalid [`GuessResult`] for `track`, with artists keyed by
/// their normalized names.
pub fn seed_result(track: &Track) -> GuessResult {
    GuessResult::seeded(track.artists.iter().map(|artist| normalize(&artist.name)))
}

/// How many *other* players are already Valid on each field of the current
/// track. Feeds the first-finder bonus.
#[derive(Clone, Debug, Default)]
pub struct FieldCompetition {
    pub title_valid: usize,
    /// Normalized artist name -> count of other players already Valid.
    pub artists_valid: HashMap<String, usize>,
}

/// Evaluate one guess against the current track.
///
/// Returns the updated result and the score delta. The stored score is the
/// running maximum across all guesses for the track, so the delta is never
/// negative; per-field states only ever improve. An empty guess leaves the
/// result untouched.
pub fn evaluate(
    guess: &str,
    track: &Track,
    prior: &GuessResult,
    opts: &RoomOptions,
    rivals: &FieldCompetition,
) -> (GuessResult, f64) {
    let normalized_guess = normalize(guess);
    let tokens: Vec<&str> = normalized_guess.split_whitespace().collect();
    let windows = token_windows(&tokens);
    if windows.is_empty() {
        return (prior.clone(), 0.0);
    }

    let mut next = prior.clone();
    let mut total = 0.0;

    let title_target = normalize(&track.name);
    total += score_field(&windows, &title_target, &mut next.title, opts, rivals.title_valid);

    for (artist_key, state) in next.artists.iter_mut() {
        let already_valid = rivals.artists_valid.get(artist_key).copied().unwrap_or(0);
        total += score_field(&windows, artist_key, state, opts, already_valid);
    }

    next.score = prior.score.max(total);
    let delta = next.score - prior.score;
    (next, delta)
}

/// Score a single field against the best-matching window.
///
/// A field already at Valid contributes its flat credit without re-scoring.
fn score_field(
    windows: &[String],
    target: &str,
    state: &mut MatchState,
    opts: &RoomOptions,
    rivals_valid: usize,
) -> f64 {
    if state.is_valid() {
        return opts.correct_credit;
    }

    let best = windows
        .iter()
        .map(|window| similarity(window, target))
        .fold(0.0_f64, f64::max);

    if best >= opts.validity_threshold {
        *state = MatchState::Valid;
        opts.correct_credit + opts.finder_bonus(rivals_valid)
    } else if best >= opts.partial_threshold {
        *state = MatchState::Partial;
        best
    } else {
        // State stays where it was; no credit for this field.
        0.0
    }
}
