#![forbid(unsafe_code)]

pub mod error;
pub mod leaderboard_service;
pub mod quiz;

pub use quiz_core::Clock;

pub use error::{LeaderboardError, SessionError};
pub use leaderboard_service::LeaderboardService;
pub use quiz::{
    AdvanceOutcome, AnswerFeedback, PlanBuilder, QuizController, QuizSession, SessionSnapshot,
    SessionStatus, TickOutcome,
};
