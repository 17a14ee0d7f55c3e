//! Ranking of stored attempts.

use std::cmp::Ordering;

use crate::model::{PlayerId, QuizAttempt};

/// A ranked attempt. `rank` is the 1-based position after sorting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub attempt_id: i64,
    pub attempt: QuizAttempt,
}

/// Orders two attempts: higher score ratio first, then most recent, then lower id.
///
/// Ratios are compared by cross-multiplication so that 8/10 and 4/5 tie exactly.
#[must_use]
pub fn compare(a: (i64, &QuizAttempt), b: (i64, &QuizAttempt)) -> Ordering {
    let lhs = u64::from(b.1.score()) * u64::from(a.1.total());
    let rhs = u64::from(a.1.score()) * u64::from(b.1.total());
    lhs.cmp(&rhs)
        .then_with(|| b.1.completed_at().cmp(&a.1.completed_at()))
        .then_with(|| a.0.cmp(&b.0))
}

/// Sorts attempts into leaderboard order and assigns ranks.
#[must_use]
pub fn rank(mut rows: Vec<(i64, QuizAttempt)>) -> Vec<LeaderboardEntry> {
    rows.sort_by(|a, b| compare((a.0, &a.1), (b.0, &b.1)));
    rows.into_iter()
        .enumerate()
        .map(|(i, (attempt_id, attempt))| LeaderboardEntry {
            rank: i + 1,
            attempt_id,
            attempt,
        })
        .collect()
}

/// Best (lowest) rank held by `player` in an already ranked board.
#[must_use]
pub fn rank_of(entries: &[LeaderboardEntry], player: &PlayerId) -> Option<usize> {
    entries
        .iter()
        .find(|e| e.attempt.player().id() == player)
        .map(|e| e.rank)
}
