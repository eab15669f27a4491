//! Core domain types for the crossword grid.

use serde::{Deserialize, Serialize};

/// Identifier of a question within a puzzle.
pub type QuestionId = String;

/// Identifier of an active game session.
pub type SessionId = String;

/// Identifier of a player submitting actions.
pub type ActorId = String;

/// Placement direction of an answer on the grid.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Direction {
    /// Left to right along a row.
    Across,
    /// Top to bottom along a column.
    Down,
}

impl Direction {
    /// Returns the unit step `(dx, dy)` between consecutive cells.
    pub fn step(self) -> (i64, i64) {
        match self {
            Direction::Across => (1, 0),
            Direction::Down => (0, 1),
        }
    }
}

/// A grid coordinate, origin in the top-left corner.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_new::new,
)]
#[display("({}, {})", x, y)]
pub struct Coordinates {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

/// A clue together with its answer placement.
///
/// Questions are loaded once per session and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    clue: String,
    answer: String,
    start_x: i64,
    start_y: i64,
    direction: Direction,
}

impl Question {
    /// Creates a new question.
    pub fn new(
        id: impl Into<QuestionId>,
        clue: impl Into<String>,
        answer: impl Into<String>,
        start_x: i64,
        start_y: i64,
        direction: Direction,
    ) -> Self {
        Self {
            id: id.into(),
            clue: clue.into(),
            answer: answer.into(),
            start_x,
            start_y,
            direction,
        }
    }

    /// Returns the question id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the clue text.
    pub fn clue(&self) -> &str {
        &self.clue
    }

    /// Returns the expected answer.
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Returns the start column (may be negative in malformed data).
    pub fn start_x(&self) -> i64 {
        self.start_x
    }

    /// Returns the start row (may be negative in malformed data).
    pub fn start_y(&self) -> i64 {
        self.start_y
    }

    /// Returns the placement direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }
}

/// One grid square of an answer map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    coordinates: Coordinates,
    expected: char,
    question_id: QuestionId,
}

impl Cell {
    pub(crate) fn new(coordinates: Coordinates, expected: char, question_id: QuestionId) -> Self {
        Self {
            coordinates,
            expected,
            question_id,
        }
    }

    /// Returns the cell coordinates.
    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    /// Returns the expected character.
    pub fn expected(&self) -> char {
        self.expected
    }

    /// Returns the owning question.
    pub fn question_id(&self) -> &str {
        &self.question_id
    }

    /// Returns true if `value` is exactly the expected character.
    pub fn accepts(&self, value: &str) -> bool {
        let mut chars = value.chars();
        chars.next() == Some(self.expected) && chars.next().is_none()
    }
}

/// Bounding box of every answer map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_new::new)]
pub struct BoardSize {
    /// Number of columns.
    pub x: u32,
    /// Number of rows.
    pub y: u32,
}

impl BoardSize {
    /// Returns true if the coordinate lies inside the board.
    pub fn contains(&self, at: Coordinates) -> bool {
        at.x < self.x && at.y < self.y
    }
}
