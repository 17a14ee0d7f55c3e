#![forbid(unsafe_code)]

pub mod fixtures;
pub mod repository;
pub mod sqlite;

pub use repository::{
    AttemptRepository, AttemptRow, FixtureQuestionBank, InMemoryRepository, QuestionBank, Storage,
    StorageError,
};
