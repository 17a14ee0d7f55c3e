use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CategoryId, QuestionId};
use crate::model::question::Question;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CategoryError {
    #[error("category name cannot be empty")]
    EmptyName,

    #[error("category {0} has no questions")]
    NoQuestions(CategoryId),

    #[error("duplicate question id {0} in category")]
    DuplicateQuestion(QuestionId),
}

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

/// A named, ordered collection of quiz questions on one subject.
///
/// Immutable once built; sessions copy the questions they need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    id: CategoryId,
    name: String,
    description: String,
    questions: Vec<Question>,
}

impl Category {
    /// # Errors
    ///
    /// Returns `CategoryError::EmptyName` for a blank name,
    /// `CategoryError::NoQuestions` for an empty question list, and
    /// `CategoryError::DuplicateQuestion` if two questions share an id.
    pub fn new(
        id: CategoryId,
        name: impl Into<String>,
        description: impl Into<String>,
        questions: Vec<Question>,
    ) -> Result<Self, CategoryError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CategoryError::EmptyName);
        }
        if questions.is_empty() {
            return Err(CategoryError::NoQuestions(id));
        }
        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(CategoryError::DuplicateQuestion(question.id().clone()));
            }
        }

        Ok(Self {
            id,
            name,
            description: description.into(),
            questions,
        })
    }

    #[must_use]
    pub fn id(&self) -> &CategoryId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn summary(&self) -> CategorySummary {
        CategorySummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            question_count: self.questions.len(),
        }
    }
}

/// Listing shape for the category picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub question_count: usize,
}
