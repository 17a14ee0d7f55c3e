use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("seconds per question must be between 1 and 3600")]
    InvalidSecondsPerQuestion,

    #[error("question limit must be > 0")]
    InvalidQuestionLimit,

    #[error("reveal delay must be at most 10000 ms")]
    InvalidRevealDelay,

    #[error("unknown quiz policy: {0}")]
    UnknownPolicy(String),
}

//
// ─── POLICY ────────────────────────────────────────────────────────────────────
//

/// How a quiz session lets the player move through questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizPolicy {
    /// Countdown timer, free navigation, explicit submit. Answers can be changed.
    Timed,
    /// One answer per question, correctness revealed, then auto-advance. No timer.
    Locked,
}

impl QuizPolicy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuizPolicy::Timed => "timed",
            QuizPolicy::Locked => "locked",
        }
    }
}

impl fmt::Display for QuizPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuizPolicy {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "timed" => Ok(QuizPolicy::Timed),
            "locked" => Ok(QuizPolicy::Locked),
            other => Err(SettingsError::UnknownPolicy(other.to_string())),
        }
    }
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

const MAX_SECONDS_PER_QUESTION: u32 = 3_600;
const MAX_REVEAL_DELAY_MS: u64 = 10_000;

/// Configuration for quiz sessions.
///
/// Controls the navigation policy, the time budget and how the question set is picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSettings {
    policy: QuizPolicy,
    seconds_per_question: u32,
    question_limit: Option<usize>,
    shuffle: bool,
    reveal_delay_ms: u64,
}

impl QuizSettings {
    /// Free-navigation quiz over the whole category, 60 seconds per question.
    #[must_use]
    pub fn timed() -> Self {
        Self {
            policy: QuizPolicy::Timed,
            seconds_per_question: 60,
            question_limit: None,
            shuffle: false,
            reveal_delay_ms: 0,
        }
    }

    /// Five shuffled questions, each locked on first answer, advancing after 1.5 s.
    #[must_use]
    pub fn locked() -> Self {
        Self {
            policy: QuizPolicy::Locked,
            seconds_per_question: 60,
            question_limit: Some(5),
            shuffle: true,
            reveal_delay_ms: 1_500,
        }
    }

    /// Preset for the given policy.
    #[must_use]
    pub fn for_policy(policy: QuizPolicy) -> Self {
        match policy {
            QuizPolicy::Timed => Self::timed(),
            QuizPolicy::Locked => Self::locked(),
        }
    }

    /// Creates custom settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if any value is out of its accepted range.
    pub fn new(
        policy: QuizPolicy,
        seconds_per_question: u32,
        question_limit: Option<usize>,
        shuffle: bool,
        reveal_delay_ms: u64,
    ) -> Result<Self, SettingsError> {
        if seconds_per_question == 0 || seconds_per_question > MAX_SECONDS_PER_QUESTION {
            return Err(SettingsError::InvalidSecondsPerQuestion);
        }
        if question_limit == Some(0) {
            return Err(SettingsError::InvalidQuestionLimit);
        }
        if reveal_delay_ms > MAX_REVEAL_DELAY_MS {
            return Err(SettingsError::InvalidRevealDelay);
        }

        Ok(Self {
            policy,
            seconds_per_question,
            question_limit,
            shuffle,
            reveal_delay_ms,
        })
    }

    /// Returns a copy with a different per-question time budget.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidSecondsPerQuestion` if out of range.
    pub fn with_seconds_per_question(self, seconds: u32) -> Result<Self, SettingsError> {
        Self::new(
            self.policy,
            seconds,
            self.question_limit,
            self.shuffle,
            self.reveal_delay_ms,
        )
    }

    #[must_use]
    pub fn policy(&self) -> QuizPolicy {
        self.policy
    }

    #[must_use]
    pub fn seconds_per_question(&self) -> u32 {
        self.seconds_per_question
    }

    #[must_use]
    pub fn question_limit(&self) -> Option<usize> {
        self.question_limit
    }

    #[must_use]
    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    #[must_use]
    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    /// Total countdown for a session of `question_count` questions.
    ///
    /// `None` for policies without a timer.
    #[must_use]
    pub fn time_limit_secs(&self, question_count: usize) -> Option<u32> {
        match self.policy {
            QuizPolicy::Timed => {
                let count = u32::try_from(question_count).unwrap_or(u32::MAX);
                Some(count.saturating_mul(self.seconds_per_question))
            }
            QuizPolicy::Locked => None,
        }
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self::timed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_budget_scales_with_question_count() {
        let settings = QuizSettings::timed();
        assert_eq!(settings.time_limit_secs(10), Some(600));
        assert_eq!(QuizSettings::locked().time_limit_secs(10), None);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert_eq!(
            QuizSettings::new(QuizPolicy::Timed, 0, None, false, 0).unwrap_err(),
            SettingsError::InvalidSecondsPerQuestion
        );
        assert_eq!(
            QuizSettings::new(QuizPolicy::Locked, 60, Some(0), true, 0).unwrap_err(),
            SettingsError::InvalidQuestionLimit
        );
        assert_eq!(
            QuizSettings::new(QuizPolicy::Locked, 60, Some(5), true, 60_000).unwrap_err(),
            SettingsError::InvalidRevealDelay
        );
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!("Timed".parse::<QuizPolicy>().unwrap(), QuizPolicy::Timed);
        assert_eq!(" locked ".parse::<QuizPolicy>().unwrap(), QuizPolicy::Locked);
        assert!(matches!(
            "random".parse::<QuizPolicy>(),
            Err(SettingsError::UnknownPolicy(_))
        ));
    }

    #[test]
    fn locked_preset_matches_portal_defaults() {
        let settings = QuizSettings::locked();
        assert_eq!(settings.question_limit(), Some(5));
        assert!(settings.shuffle());
        assert_eq!(settings.reveal_delay(), Duration::from_millis(1_500));
    }
}
