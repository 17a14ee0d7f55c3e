use std::sync::Arc;

use quiz_core::leaderboard::{self, LeaderboardEntry};
use quiz_core::model::{CategoryId, PlayerId};
use storage::repository::AttemptRepository;

use crate::error::LeaderboardError;

/// Ranks stored attempts, overall or per category.
#[derive(Clone)]
pub struct LeaderboardService {
    attempts: Arc<dyn AttemptRepository>,
}

impl LeaderboardService {
    #[must_use]
    pub fn new(attempts: Arc<dyn AttemptRepository>) -> Self {
        Self { attempts }
    }

    async fn ranked(
        &self,
        category: Option<&CategoryId>,
    ) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let rows = self.attempts.list_attempts(category, u32::MAX).await?;
        Ok(leaderboard::rank(
            rows.into_iter().map(|row| (row.id, row.attempt)).collect(),
        ))
    }

    /// Top `limit` entries, best first.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardError::Storage` on repository failures.
    pub async fn standings(
        &self,
        category: Option<&CategoryId>,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let mut entries = self.ranked(category).await?;
        entries.truncate(limit);
        Ok(entries)
    }

    /// Best rank held by `player`, if they have any attempt on this board.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardError::Storage` on repository failures.
    pub async fn rank_of(
        &self,
        player: &PlayerId,
        category: Option<&CategoryId>,
    ) -> Result<Option<usize>, LeaderboardError> {
        let entries = self.ranked(category).await?;
        Ok(leaderboard::rank_of(&entries, player))
    }
}
