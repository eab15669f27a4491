//! TOML puzzle files.
//!
//! ```toml
//! title = "Mini"
//!
//! [[questions]]
//! id = "1a"
//! clue = "Feline"
//! answer = "CAT"
//! x = 0
//! y = 0
//! direction = "ACROSS"
//! ```

use crate::config::ConfigError;
use crossword_core::{CrosswordError, Direction, Puzzle, Question};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// One question entry of a puzzle file.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct QuestionEntry {
    id: String,
    clue: String,
    answer: String,
    x: i64,
    y: i64,
    direction: Direction,
}

impl From<&QuestionEntry> for Question {
    fn from(entry: &QuestionEntry) -> Self {
        Question::new(
            entry.id.clone(),
            entry.clue.clone(),
            entry.answer.clone(),
            entry.x,
            entry.y,
            entry.direction,
        )
    }
}

/// A puzzle as written on disk.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct PuzzleFile {
    #[serde(default)]
    title: String,
    #[serde(default)]
    questions: Vec<QuestionEntry>,
}

impl PuzzleFile {
    /// Reads a puzzle file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading puzzle file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read puzzle file: {}", e)))?;
        let file = Self::from_toml_str(&content)?;
        info!(title = %file.title, questions = file.questions.len(), "Puzzle file loaded");
        Ok(file)
    }

    /// Parses a puzzle from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not a valid puzzle file.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::new(format!("Failed to parse puzzle: {}", e)))
    }

    /// Returns the entries as engine questions, in file order.
    pub fn to_questions(&self) -> Vec<Question> {
        self.questions.iter().map(Question::from).collect()
    }

    /// Validates the geometry and builds the puzzle.
    ///
    /// # Errors
    ///
    /// Returns the first geometry error; no partial puzzle is produced.
    pub fn to_puzzle(&self) -> Result<Puzzle, CrosswordError> {
        Puzzle::new(self.to_questions())
    }
}
