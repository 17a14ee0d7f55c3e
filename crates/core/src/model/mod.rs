mod attempt;
mod category;
mod ids;
mod question;
mod settings;

pub use ids::{CategoryId, ParseIdError, PlayerId, QuestionId};

pub use attempt::{AttemptError, Player, QuizAttempt};
pub use category::{Category, CategoryError, CategorySummary};
pub use question::{OPTION_COUNT, OptionIndex, Question, QuestionError};
pub use settings::{QuizPolicy, QuizSettings, SettingsError};
