//! Answer maps: a question's answer laid out on grid coordinates.

use crate::error::CrosswordError;
use crate::types::{Cell, Coordinates, Direction, Question, QuestionId};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Ordered cells realizing one question's answer.
///
/// Cell `i` sits `i` unit steps from the start along the question's direction
/// and expects the answer's `i`-th character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerMap {
    question_id: QuestionId,
    direction: Direction,
    cells: Vec<Cell>,
}

impl AnswerMap {
    /// Builds the answer map for a question.
    ///
    /// # Errors
    ///
    /// Returns [`CrosswordError::InvalidQuestionGeometry`] if the answer is
    /// empty or any derived coordinate falls outside the grid's `u32` range.
    #[instrument(skip(question), fields(question_id = %question.id(), direction = %question.direction()))]
    pub fn build(question: &Question) -> Result<Self, CrosswordError> {
        let invalid = |reason: String| {
            warn!(question_id = %question.id(), %reason, "Rejecting question geometry");
            CrosswordError::InvalidQuestionGeometry {
                question_id: question.id().to_string(),
                reason,
            }
        };

        if question.answer().is_empty() {
            return Err(invalid("answer is empty".to_string()));
        }

        let (dx, dy) = question.direction().step();
        let mut cells = Vec::with_capacity(question.answer().chars().count());
        for (i, expected) in question.answer().chars().enumerate() {
            let offset = i as i64;
            let x = question.start_x() + dx * offset;
            let y = question.start_y() + dy * offset;
            if x < 0 || y < 0 {
                return Err(invalid(format!("cell {} at ({}, {}) is negative", i, x, y)));
            }
            // The board size is one past the largest coordinate, so `u32::MAX` itself is off grid.
            let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
                return Err(invalid(format!("cell {} at ({}, {}) is out of range", i, x, y)));
            };
            if x == u32::MAX || y == u32::MAX {
                return Err(invalid(format!("cell {} at ({}, {}) is out of range", i, x, y)));
            }
            cells.push(Cell::new(
                Coordinates::new(x, y),
                expected,
                question.id().to_string(),
            ));
        }

        debug!(len = cells.len(), "Answer map built");
        Ok(Self {
            question_id: question.id().to_string(),
            direction: question.direction(),
            cells,
        })
    }

    /// Returns the owning question id.
    pub fn question_id(&self) -> &str {
        &self.question_id
    }

    /// Returns the placement direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the cells in answer order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of cells, equal to the answer length in characters.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false for a successfully built map.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the index of the cell at `at`, if the map covers it.
    pub fn position_of(&self, at: Coordinates) -> Option<usize> {
        self.cells.iter().position(|c| c.coordinates() == at)
    }

    /// Returns true if the map covers `at`.
    pub fn contains(&self, at: Coordinates) -> bool {
        self.position_of(at).is_some()
    }
}
