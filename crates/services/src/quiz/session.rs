use chrono::{DateTime, Utc};
use rand::Rng;
use std::fmt;

use quiz_core::model::{Category, CategoryId, OptionIndex, Question, QuizPolicy, QuizSettings};
use quiz_core::scoring::{self, QuizResult, ReviewReport};

use super::plan::PlanBuilder;
use super::progress::SessionSnapshot;
use crate::error::SessionError;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    InProgress,
    Completed,
}

/// What the player learns right after choosing an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerFeedback {
    /// Timed quizzes: the choice is stored and can still be changed.
    Recorded {
        question_index: usize,
        selected: OptionIndex,
    },
    /// Locked quizzes: the choice is final and correctness is shown.
    Revealed {
        question_index: usize,
        selected: OptionIndex,
        correct_option: OptionIndex,
        is_correct: bool,
        is_last: bool,
    },
}

/// Result of one countdown tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Running { remaining_secs: u32 },
    /// The countdown hit zero and the session was submitted.
    Expired(QuizResult),
    /// The session has no timer or is already complete.
    Ignored,
}

/// Result of the deferred move after a revealed answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Moved { current_index: usize },
    Completed(QuizResult),
    Ignored,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory state of one quiz attempt.
///
/// Holds the planned question list, the per-question answers and the countdown.
/// Pure state machine: timers and deferred moves are driven from outside via
/// [`QuizSession::tick`] and [`QuizSession::advance_after_reveal`].
pub struct QuizSession {
    category_id: CategoryId,
    category_name: String,
    policy: QuizPolicy,
    questions: Vec<Question>,
    current: usize,
    answers: Vec<Option<OptionIndex>>,
    locked: Vec<bool>,
    remaining_secs: Option<u32>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    result: Option<QuizResult>,
}

impl QuizSession {
    /// Start a session over `category`, picking questions according to `settings`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the plan selects no questions.
    pub fn start<R: Rng + ?Sized>(
        category: &Category,
        settings: &QuizSettings,
        rng: &mut R,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let questions = PlanBuilder::from_settings(category, settings).build(rng);
        Self::from_questions(category, questions, settings, started_at)
    }

    /// Start a session over an explicit question list.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `questions` is empty.
    pub fn from_questions(
        category: &Category,
        questions: Vec<Question>,
        settings: &QuizSettings,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        let len = questions.len();

        Ok(Self {
            category_id: category.id().clone(),
            category_name: category.name().to_owned(),
            policy: settings.policy(),
            remaining_secs: settings.time_limit_secs(len),
            questions,
            current: 0,
            answers: vec![None; len],
            locked: vec![false; len],
            started_at,
            completed_at: None,
            result: None,
        })
    }

    #[must_use]
    pub fn category_id(&self) -> &CategoryId {
        &self.category_id
    }

    #[must_use]
    pub fn category_name(&self) -> &str {
        &self.category_name
    }

    #[must_use]
    pub fn policy(&self) -> QuizPolicy {
        self.policy
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn answers(&self) -> &[Option<OptionIndex>] {
        &self.answers
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    /// Seconds left on the countdown; `None` for untimed policies.
    #[must_use]
    pub fn remaining_secs(&self) -> Option<u32> {
        self.remaining_secs
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        if self.result.is_some() {
            SessionStatus::Completed
        } else {
            SessionStatus::InProgress
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    /// The question being shown, or `None` once the session is complete.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.is_complete() {
            return None;
        }
        self.questions.get(self.current)
    }

    /// Whether the current question is locked (locked policy, already answered).
    #[must_use]
    pub fn is_current_locked(&self) -> bool {
        self.locked.get(self.current).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    /// Per-question breakdown, available once the session is complete.
    #[must_use]
    pub fn review(&self) -> Option<ReviewReport> {
        self.is_complete()
            .then(|| ReviewReport::build(&self.questions, &self.answers))
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            category_id: self.category_id.clone(),
            policy: self.policy,
            current_index: self.current,
            total: self.total(),
            answered: self.answered_count(),
            remaining_secs: self.remaining_secs,
            is_complete: self.is_complete(),
        }
    }

    /// Record an answer for the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after submission,
    /// `SessionError::OptionOutOfRange` unless `option < 4`, and
    /// `SessionError::AlreadyAnswered` when a locked question is answered twice.
    pub fn select_answer(&mut self, option: usize) -> Result<AnswerFeedback, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        let selected =
            OptionIndex::new(option).map_err(|_| SessionError::OptionOutOfRange(option))?;
        let index = self.current;

        match self.policy {
            QuizPolicy::Timed => {
                self.answers[index] = Some(selected);
                Ok(AnswerFeedback::Recorded {
                    question_index: index,
                    selected,
                })
            }
            QuizPolicy::Locked => {
                if self.locked[index] {
                    return Err(SessionError::AlreadyAnswered(index));
                }
                self.answers[index] = Some(selected);
                self.locked[index] = true;
                let correct_option = self.questions[index].correct_option();
                Ok(AnswerFeedback::Revealed {
                    question_index: index,
                    selected,
                    correct_option,
                    is_correct: selected == correct_option,
                    is_last: index + 1 == self.questions.len(),
                })
            }
        }
    }

    /// Jump to question `index`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::QuestionOutOfRange` if `index >= total`,
    /// `SessionError::NavigationLocked` for any move under the locked policy, and
    /// `SessionError::Completed` after submission.
    pub fn go_to(&mut self, index: usize) -> Result<(), SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        if index >= self.questions.len() {
            return Err(SessionError::QuestionOutOfRange {
                index,
                total: self.questions.len(),
            });
        }
        if self.policy == QuizPolicy::Locked && index != self.current {
            return Err(SessionError::NavigationLocked);
        }
        self.current = index;
        Ok(())
    }

    /// # Errors
    ///
    /// Same as [`QuizSession::go_to`].
    pub fn next(&mut self) -> Result<(), SessionError> {
        self.go_to(self.current + 1)
    }

    /// # Errors
    ///
    /// Same as [`QuizSession::go_to`]; moving before the first question is out of range.
    pub fn previous(&mut self) -> Result<(), SessionError> {
        let Some(index) = self.current.checked_sub(1) else {
            return Err(SessionError::QuestionOutOfRange {
                index: 0,
                total: self.questions.len(),
            });
        };
        self.go_to(index)
    }

    /// Score the session and mark it complete.
    ///
    /// Idempotent: once complete, returns the cached result without touching state.
    pub fn submit(&mut self, completed_at: DateTime<Utc>) -> &QuizResult {
        if self.result.is_none() {
            self.completed_at = Some(completed_at);
        }
        self.result
            .get_or_insert_with(|| scoring::score(&self.questions, &self.answers))
    }

    /// Advance the countdown by one second, submitting when it reaches zero.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if self.is_complete() {
            return TickOutcome::Ignored;
        }
        let Some(remaining) = self.remaining_secs.as_mut() else {
            return TickOutcome::Ignored;
        };
        *remaining = remaining.saturating_sub(1);
        if *remaining > 0 {
            return TickOutcome::Running {
                remaining_secs: *remaining,
            };
        }
        TickOutcome::Expired(self.submit(now).clone())
    }

    /// Move past a revealed answer: next question, or submit after the last one.
    ///
    /// Ignored unless the current question is locked and the session is running.
    pub fn advance_after_reveal(&mut self, now: DateTime<Utc>) -> AdvanceOutcome {
        if self.is_complete() || !self.is_current_locked() {
            return AdvanceOutcome::Ignored;
        }
        if self.current + 1 < self.questions.len() {
            self.current += 1;
            return AdvanceOutcome::Moved {
                current_index: self.current,
            };
        }
        AdvanceOutcome::Completed(self.submit(now).clone())
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("category_id", &self.category_id)
            .field("policy", &self.policy)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("answered", &self.answered_count())
            .field("remaining_secs", &self.remaining_secs)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionId;
    use quiz_core::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn build_category(n: usize) -> Category {
        let questions = (0..n)
            .map(|i| {
                Question::new(
                    QuestionId::new(format!("q{i}")),
                    format!("Question {i}"),
                    ["A", "B", "C", "D"].map(String::from),
                    i % 4,
                )
                .unwrap()
            })
            .collect();
        Category::new(CategoryId::new("test"), "Test", "", questions).unwrap()
    }

    fn timed(n: usize) -> QuizSession {
        let category = build_category(n);
        QuizSession::start(
            &category,
            &QuizSettings::timed(),
            &mut StdRng::seed_from_u64(0),
            fixed_now(),
        )
        .unwrap()
    }

    fn locked(n: usize) -> QuizSession {
        let category = build_category(n);
        let settings = QuizSettings::new(QuizPolicy::Locked, 60, None, false, 1_500).unwrap();
        QuizSession::start(
            &category,
            &settings,
            &mut StdRng::seed_from_u64(0),
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn timed_session_starts_clean() {
        let session = timed(5);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.remaining_secs(), Some(300));
        assert!(session.answers().iter().all(Option::is_none));
        assert_eq!(session.status(), SessionStatus::InProgress);
        assert!(session.result().is_none());
    }

    #[test]
    fn timed_answers_can_be_changed() {
        let mut session = timed(3);
        session.select_answer(1).unwrap();
        let feedback = session.select_answer(2).unwrap();
        assert!(matches!(
            feedback,
            AnswerFeedback::Recorded {
                question_index: 0,
                ..
            }
        ));
        assert_eq!(session.answers()[0], Some(OptionIndex::new(2).unwrap()));
    }

    #[test]
    fn rejects_option_out_of_range() {
        let mut session = timed(3);
        let err = session.select_answer(4).unwrap_err();
        assert!(matches!(err, SessionError::OptionOutOfRange(4)));
        assert!(err.is_out_of_range());
        assert!(session.answers()[0].is_none());
    }

    #[test]
    fn free_navigation_respects_bounds() {
        let mut session = timed(3);
        session.go_to(2).unwrap();
        assert_eq!(session.current_index(), 2);
        session.go_to(0).unwrap();

        let err = session.go_to(3).unwrap_err();
        assert!(matches!(
            err,
            SessionError::QuestionOutOfRange { index: 3, total: 3 }
        ));
        assert_eq!(session.current_index(), 0);

        assert!(session.previous().is_err());
        session.next().unwrap();
        session.next().unwrap();
        assert!(session.next().is_err());
        assert_eq!(session.current_index(), 2);
    }

    #[test]
    fn scores_mixed_answers_and_caches_result() {
        let mut session = timed(5);
        // correct options are i % 4: 0, 1, 2, 3, 0
        for (index, option) in [(0, Some(0)), (1, Some(1)), (2, Some(3)), (3, None), (4, Some(0))]
        {
            session.go_to(index).unwrap();
            if let Some(option) = option {
                session.select_answer(option).unwrap();
            }
        }

        let first = session.submit(fixed_now()).clone();
        assert_eq!(first.score(), 3);
        assert_eq!(first.percentage(), 60);

        let later = fixed_now() + chrono::Duration::seconds(30);
        let second = session.submit(later).clone();
        assert_eq!(first, second);
        assert_eq!(session.completed_at(), Some(fixed_now()));
        assert!(matches!(
            session.select_answer(0),
            Err(SessionError::Completed)
        ));
        assert!(session.current_question().is_none());
    }

    #[test]
    fn empty_submission_scores_zero() {
        let mut session = timed(4);
        let result = session.submit(fixed_now());
        assert_eq!(result.score(), 0);
        assert_eq!(result.percentage(), 0);
        let review = session.review().unwrap();
        assert_eq!(review.missed().count(), 4);
    }

    #[test]
    fn tick_at_one_second_expires_the_session() {
        let category = build_category(1);
        let settings = QuizSettings::timed().with_seconds_per_question(1).unwrap();
        let mut session = QuizSession::start(
            &category,
            &settings,
            &mut StdRng::seed_from_u64(0),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(session.remaining_secs(), Some(1));

        let outcome = session.tick(fixed_now());
        assert!(matches!(outcome, TickOutcome::Expired(_)));
        assert_eq!(session.remaining_secs(), Some(0));
        assert_eq!(session.status(), SessionStatus::Completed);
        assert!(session.result().is_some());
    }

    #[test]
    fn tick_after_submit_is_ignored() {
        let mut session = timed(2);
        session.select_answer(0).unwrap();
        let result = session.submit(fixed_now()).clone();
        let remaining = session.remaining_secs();

        assert_eq!(session.tick(fixed_now()), TickOutcome::Ignored);
        assert_eq!(session.remaining_secs(), remaining);
        assert_eq!(session.result(), Some(&result));
    }

    #[test]
    fn ticks_count_down() {
        let mut session = timed(1);
        assert_eq!(
            session.tick(fixed_now()),
            TickOutcome::Running { remaining_secs: 59 }
        );
        assert_eq!(session.remaining_secs(), Some(59));
    }

    #[test]
    fn locked_session_has_no_timer_and_reveals() {
        let mut session = locked(2);
        assert_eq!(session.remaining_secs(), None);
        assert_eq!(session.tick(fixed_now()), TickOutcome::Ignored);

        let feedback = session.select_answer(1).unwrap();
        assert_eq!(
            feedback,
            AnswerFeedback::Revealed {
                question_index: 0,
                selected: OptionIndex::new(1).unwrap(),
                correct_option: OptionIndex::new(0).unwrap(),
                is_correct: false,
                is_last: false,
            }
        );
        assert!(matches!(
            session.select_answer(0),
            Err(SessionError::AlreadyAnswered(0))
        ));
        assert!(matches!(session.go_to(1), Err(SessionError::NavigationLocked)));
    }

    #[test]
    fn locked_session_advances_then_completes() {
        let mut session = locked(2);
        assert_eq!(
            session.advance_after_reveal(fixed_now()),
            AdvanceOutcome::Ignored
        );

        session.select_answer(0).unwrap();
        assert_eq!(
            session.advance_after_reveal(fixed_now()),
            AdvanceOutcome::Moved { current_index: 1 }
        );

        session.select_answer(1).unwrap();
        let AdvanceOutcome::Completed(result) = session.advance_after_reveal(fixed_now()) else {
            panic!("expected completion");
        };
        assert_eq!(result.score(), 2);
        assert_eq!(result.percentage(), 100);
        assert_eq!(
            session.advance_after_reveal(fixed_now()),
            AdvanceOutcome::Ignored
        );
    }

    #[test]
    fn locked_preset_runs_five_random_questions() {
        let category = build_category(10);
        let session = QuizSession::start(
            &category,
            &QuizSettings::locked(),
            &mut StdRng::seed_from_u64(9),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(session.total(), 5);
        assert_eq!(session.answers().len(), 5);
    }

    #[test]
    fn empty_question_list_is_rejected() {
        let category = build_category(1);
        let err = QuizSession::from_questions(
            &category,
            Vec::new(),
            &QuizSettings::timed(),
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::Empty));
    }
}
