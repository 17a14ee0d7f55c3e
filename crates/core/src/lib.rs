#![forbid(unsafe_code)]

pub mod error;
pub mod leaderboard;
pub mod model;
pub mod scoring;
pub mod time;

pub use error::Error;
pub use scoring::{QuizResult, ReviewItem, ReviewReport};
pub use time::Clock;
