//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::CategoryId;
use storage::repository::StorageError;

/// Errors emitted by quiz sessions and the controller that drives them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("unknown quiz category: {0}")]
    CategoryNotFound(CategoryId),
    #[error("no questions available for session")]
    Empty,
    #[error("no active quiz session")]
    NoActiveSession,
    #[error("session already completed")]
    Completed,
    #[error("option index {0} is out of range (expected 0..=3)")]
    OptionOutOfRange(usize),
    #[error("question index {index} is out of range (session has {total})")]
    QuestionOutOfRange { index: usize, total: usize },
    #[error("question {0} has already been answered")]
    AlreadyAnswered(usize),
    #[error("navigation is locked for this quiz")]
    NavigationLocked,
    #[error("quiz timers require a running tokio runtime")]
    NoRuntime,
    #[error("quiz state lock poisoned")]
    StatePoisoned,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// True for index errors, which indicate a defect in the caller rather than user input.
    #[must_use]
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            SessionError::OptionOutOfRange(_) | SessionError::QuestionOutOfRange { .. }
        )
    }
}

/// Errors emitted by `LeaderboardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LeaderboardError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}
