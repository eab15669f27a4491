//! SQLite persistence for puzzles and committed action logs.

mod error;
mod models;
mod repository;
mod schema;

pub use error::DbError;
pub use models::{ActionRow, QuestionRow};
pub use repository::CrosswordRepository;
