use thiserror::Error;

use crate::model::{AttemptError, CategoryError, QuestionError, SettingsError};

/// Any validation failure raised while building domain values.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Attempt(#[from] AttemptError),
}
