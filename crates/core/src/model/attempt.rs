use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{CategoryId, PlayerId};
use crate::scoring::{QuizResult, percentage};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("attempt must contain at least one question")]
    EmptyAttempt,

    #[error("score ({score}) exceeds total questions ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },

    #[error("player display name cannot be empty")]
    EmptyDisplayName,
}

/// The person a completed attempt is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    id: PlayerId,
    display_name: String,
}

impl Player {
    /// # Errors
    ///
    /// Returns `AttemptError::EmptyDisplayName` for a blank display name.
    pub fn new(id: PlayerId, display_name: impl Into<String>) -> Result<Self, AttemptError> {
        let display_name = display_name.into();
        if display_name.trim().is_empty() {
            return Err(AttemptError::EmptyDisplayName);
        }
        Ok(Self { id, display_name })
    }

    #[must_use]
    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

/// A completed quiz recorded against a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAttempt {
    player: Player,
    category_id: CategoryId,
    score: u32,
    total: u32,
    completed_at: DateTime<Utc>,
}

impl QuizAttempt {
    /// Rehydrate an attempt from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::EmptyAttempt` when `total` is 0 and
    /// `AttemptError::ScoreExceedsTotal` when `score > total`.
    pub fn from_persisted(
        player: Player,
        category_id: CategoryId,
        score: u32,
        total: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, AttemptError> {
        if total == 0 {
            return Err(AttemptError::EmptyAttempt);
        }
        if score > total {
            return Err(AttemptError::ScoreExceedsTotal { score, total });
        }
        Ok(Self {
            player,
            category_id,
            score,
            total,
            completed_at,
        })
    }

    /// Build an attempt from a session result.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::EmptyAttempt` if the result has no questions.
    pub fn from_result(
        player: Player,
        category_id: CategoryId,
        result: &QuizResult,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, AttemptError> {
        Self::from_persisted(
            player,
            category_id,
            result.score(),
            result.total(),
            completed_at,
        )
    }

    #[must_use]
    pub fn player(&self) -> &Player {
        &self.player
    }

    #[must_use]
    pub fn category_id(&self) -> &CategoryId {
        &self.category_id
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn percentage(&self) -> u8 {
        percentage(self.score, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn player() -> Player {
        Player::new(PlayerId::new("user1"), "Alex").unwrap()
    }

    #[test]
    fn rejects_inconsistent_counts() {
        let err = QuizAttempt::from_persisted(player(), CategoryId::new("math"), 6, 5, fixed_now())
            .unwrap_err();
        assert_eq!(err, AttemptError::ScoreExceedsTotal { score: 6, total: 5 });

        let err = QuizAttempt::from_persisted(player(), CategoryId::new("math"), 0, 0, fixed_now())
            .unwrap_err();
        assert_eq!(err, AttemptError::EmptyAttempt);
    }

    #[test]
    fn percentage_uses_rounded_ratio() {
        let attempt =
            QuizAttempt::from_persisted(player(), CategoryId::new("math"), 2, 3, fixed_now())
                .unwrap();
        assert_eq!(attempt.percentage(), 67);
    }

    #[test]
    fn player_requires_display_name() {
        assert_eq!(
            Player::new(PlayerId::new("u"), "").unwrap_err(),
            AttemptError::EmptyDisplayName
        );
    }
}
