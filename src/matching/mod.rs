//! Fuzzy text matching: normalization, similarity scoring and guess
//! evaluation.
//!
//! Everything here is pure and synchronous; the room layer calls into it
//! under its own lock.

mod matcher;
mod normalize;
mod similarity;

pub use matcher::{FieldCompetition, evaluate, seed_result, token_windows};
pub use normalize::normalize;
pub use similarity::similarity;
