use async_trait::async_trait;
use quiz_core::model::{Category, CategoryId, CategorySummary, QuizAttempt};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::fixtures;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A stored attempt together with its storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRow {
    pub id: i64,
    pub attempt: QuizAttempt,
}

impl AttemptRow {
    #[must_use]
    pub fn new(id: i64, attempt: QuizAttempt) -> Self {
        Self { id, attempt }
    }
}

/// Read-only catalog of quiz categories.
///
/// Lookups are synchronous; the catalog is loaded once and never mutated.
pub trait QuestionBank: Send + Sync {
    /// Summaries of all categories, in catalog order.
    fn list_categories(&self) -> Vec<CategorySummary>;

    /// Fetch a full category by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for unknown ids.
    fn get_category(&self, id: &CategoryId) -> Result<Category, StorageError>;
}

/// Repository contract for completed, attributed attempts.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Append an attempt and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    async fn append_attempt(&self, attempt: &QuizAttempt) -> Result<i64, StorageError>;

    /// Fetch an attempt by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_attempt(&self, id: i64) -> Result<QuizAttempt, StorageError>;

    /// List attempts newest first, optionally restricted to one category.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on query failures.
    async fn list_attempts(
        &self,
        category: Option<&CategoryId>,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError>;
}

//
// ─── FIXTURE BANK ──────────────────────────────────────────────────────────────
//

/// Question bank backed by an in-process list of categories.
#[derive(Debug, Clone)]
pub struct FixtureQuestionBank {
    categories: Arc<Vec<Category>>,
}

impl FixtureQuestionBank {
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if two categories share an id.
    pub fn new(categories: Vec<Category>) -> Result<Self, StorageError> {
        let mut seen = HashSet::with_capacity(categories.len());
        if categories.iter().any(|c| !seen.insert(c.id().clone())) {
            return Err(StorageError::Conflict);
        }
        Ok(Self {
            categories: Arc::new(categories),
        })
    }

    /// Bank holding the built-in portal categories.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the fixtures fail validation.
    pub fn portal() -> Result<Self, StorageError> {
        let categories = fixtures::portal_categories()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Self::new(categories)
    }
}

impl QuestionBank for FixtureQuestionBank {
    fn list_categories(&self) -> Vec<CategorySummary> {
        self.categories.iter().map(Category::summary).collect()
    }

    fn get_category(&self, id: &CategoryId) -> Result<Category, StorageError> {
        self.categories
            .iter()
            .find(|c| c.id() == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

//
// ─── IN-MEMORY ATTEMPTS ────────────────────────────────────────────────────────
//

#[derive(Default)]
struct AttemptLog {
    next_id: i64,
    rows: Vec<AttemptRow>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    attempts: Arc<Mutex<AttemptLog>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn append_attempt(&self, attempt: &QuizAttempt) -> Result<i64, StorageError> {
        let mut guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.next_id += 1;
        let id = guard.next_id;
        guard.rows.push(AttemptRow::new(id, attempt.clone()));
        Ok(id)
    }

    async fn get_attempt(&self, id: i64) -> Result<QuizAttempt, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .rows
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.attempt.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn list_attempts(
        &self,
        category: Option<&CategoryId>,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows: Vec<AttemptRow> = guard
            .rows
            .iter()
            .filter(|row| category.is_none_or(|c| row.attempt.category_id() == c))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.attempt
                .completed_at()
                .cmp(&a.attempt.completed_at())
                .then_with(|| b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

/// Aggregates the question bank and attempt store behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionBank>,
    pub attempts: Arc<dyn AttemptRepository>,
}

impl Storage {
    /// Portal fixtures plus an in-memory attempt log.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the fixture bank cannot be built.
    pub fn in_memory() -> Result<Self, StorageError> {
        let questions: Arc<dyn QuestionBank> = Arc::new(FixtureQuestionBank::portal()?);
        let attempts: Arc<dyn AttemptRepository> = Arc::new(InMemoryRepository::new());
        Ok(Self {
            questions,
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{Player, PlayerId};
    use quiz_core::time::fixed_now;

    fn attempt(category: &str, score: u32, minutes: i64) -> QuizAttempt {
        QuizAttempt::from_persisted(
            Player::new(PlayerId::new("user1"), "Alex").unwrap(),
            CategoryId::new(category),
            score,
            5,
            fixed_now() + Duration::minutes(minutes),
        )
        .unwrap()
    }

    #[test]
    fn portal_bank_lists_unique_categories() {
        let bank = FixtureQuestionBank::portal().unwrap();
        let summaries = bank.list_categories();
        assert_eq!(summaries.len(), 3);
        let ids: HashSet<_> = summaries.iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids.len(), summaries.len());
        assert_eq!(summaries[0].id, CategoryId::new("it-ai"));
    }

    #[test]
    fn unknown_category_is_not_found() {
        let bank = FixtureQuestionBank::portal().unwrap();
        let err = bank.get_category(&CategoryId::new("history")).unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[test]
    fn duplicate_category_ids_conflict() {
        let mut categories = fixtures::portal_categories().unwrap();
        categories.push(categories[0].clone());
        assert!(matches!(
            FixtureQuestionBank::new(categories),
            Err(StorageError::Conflict)
        ));
    }

    #[tokio::test]
    async fn lists_attempts_newest_first_with_filter() {
        let repo = InMemoryRepository::new();
        let first = repo.append_attempt(&attempt("math", 3, 0)).await.unwrap();
        let second = repo.append_attempt(&attempt("bio", 4, 1)).await.unwrap();
        let third = repo.append_attempt(&attempt("math", 5, 2)).await.unwrap();

        let all = repo.list_attempts(None, 10).await.unwrap();
        let ids: Vec<_> = all.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![third, second, first]);

        let math = repo
            .list_attempts(Some(&CategoryId::new("math")), 1)
            .await
            .unwrap();
        assert_eq!(math.len(), 1);
        assert_eq!(math[0].id, third);

        let fetched = repo.get_attempt(second).await.unwrap();
        assert_eq!(fetched.score(), 4);
        assert!(matches!(
            repo.get_attempt(99).await,
            Err(StorageError::NotFound)
        ));
    }
}
