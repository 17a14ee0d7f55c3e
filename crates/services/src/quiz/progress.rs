use quiz_core::model::{CategoryId, QuizPolicy};

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub category_id: CategoryId,
    pub policy: QuizPolicy,
    pub current_index: usize,
    pub total: usize,
    pub answered: usize,
    pub remaining_secs: Option<u32>,
    pub is_complete: bool,
}
