mod controller;
mod plan;
mod progress;
mod session;

// Public API of the quiz subsystem.
pub use crate::error::SessionError;
pub use controller::QuizController;
pub use plan::PlanBuilder;
pub use progress::SessionSnapshot;
pub use session::{AdvanceOutcome, AnswerFeedback, QuizSession, SessionStatus, TickOutcome};
