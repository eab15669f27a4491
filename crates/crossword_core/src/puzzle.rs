//! Validated puzzle: questions with their answer maps and board size.

use crate::answer_map::AnswerMap;
use crate::error::CrosswordError;
use crate::geometry::{self, Intersection};
#[cfg(debug_assertions)]
use crate::invariants::{InvariantSet, PuzzleInvariants};
use crate::types::{BoardSize, Cell, Coordinates, Direction, Question};
use std::collections::HashSet;
use tracing::{info, instrument, warn};

/// An immutable, validated set of questions.
///
/// Construction refuses any invalid geometry instead of keeping the valid
/// subset, so a board is never rendered from a partial puzzle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    questions: Vec<Question>,
    answer_maps: Vec<AnswerMap>,
    size: BoardSize,
}

impl Puzzle {
    /// Validates questions and builds their answer maps.
    ///
    /// # Errors
    ///
    /// - [`CrosswordError::InvalidQuestionGeometry`] for an empty answer or negative cell
    /// - [`CrosswordError::DuplicateQuestion`] if two questions share an id
    /// - [`CrosswordError::ConflictingIntersection`] if crossing answers disagree
    #[instrument(skip(questions), fields(count = questions.len()))]
    pub fn new(questions: Vec<Question>) -> Result<Self, CrosswordError> {
        let mut seen = HashSet::new();
        for question in &questions {
            if !seen.insert(question.id()) {
                warn!(question_id = %question.id(), "Duplicate question id");
                return Err(CrosswordError::DuplicateQuestion(question.id().to_string()));
            }
        }

        let answer_maps = questions
            .iter()
            .map(AnswerMap::build)
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(conflict) = geometry::intersections(&answer_maps)
            .into_iter()
            .find(|crossing| !crossing.agrees())
        {
            let first = conflict.cells[0];
            let second = conflict
                .cells
                .iter()
                .find(|c| c.expected() != first.expected())
                .copied()
                .unwrap_or(first);
            warn!(at = %conflict.at, first = %first.question_id(), second = %second.question_id(), "Crossing answers disagree");
            return Err(CrosswordError::ConflictingIntersection {
                at: conflict.at,
                first: first.question_id().to_string(),
                first_expected: first.expected(),
                second: second.question_id().to_string(),
                second_expected: second.expected(),
            });
        }

        let size = geometry::compute_board_size(&answer_maps);
        let puzzle = Self {
            questions,
            answer_maps,
            size,
        };

        #[cfg(debug_assertions)]
        PuzzleInvariants::check_all(&puzzle).map_err(|violations| {
            let descriptions = violations
                .iter()
                .map(|v| v.description.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            CrosswordError::InvariantViolation(descriptions)
        })?;

        info!(
            questions = puzzle.questions.len(),
            width = size.x,
            height = size.y,
            "Puzzle validated"
        );
        Ok(puzzle)
    }

    /// Returns the questions in load order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Returns the answer maps, index-aligned with [`Puzzle::questions`].
    pub fn answer_maps(&self) -> &[AnswerMap] {
        &self.answer_maps
    }

    /// Returns the bounding board size.
    pub fn size(&self) -> BoardSize {
        self.size
    }

    /// Looks up a question by id.
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    /// Looks up a question's answer map by question id.
    pub fn answer_map(&self, id: &str) -> Option<&AnswerMap> {
        self.answer_maps.iter().find(|m| m.question_id() == id)
    }

    /// Resolves a coordinate to the first cell covering it.
    ///
    /// # Errors
    ///
    /// Returns [`CrosswordError::CellNotFound`] for a coordinate outside every answer.
    pub fn resolve_cell(&self, x: u32, y: u32) -> Result<&Cell, CrosswordError> {
        geometry::resolve_cell(x, y, &self.answer_maps)
    }

    /// Returns every cell covering a coordinate.
    pub fn resolve_cells(&self, x: u32, y: u32) -> Vec<&Cell> {
        geometry::resolve_cells(x, y, &self.answer_maps)
    }

    /// Lists the crossing coordinates.
    pub fn intersections(&self) -> Vec<Intersection<'_>> {
        geometry::intersections(&self.answer_maps)
    }

    /// Returns questions visible under a direction filter; `None` shows all.
    pub fn questions_in(&self, filter: Option<Direction>) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| filter.is_none_or(|d| q.direction() == d))
            .collect()
    }

    /// Finds the unique question under `filter` whose answer covers `at`.
    ///
    /// A crossing with no filter matches two questions and resolves to `None`.
    pub fn question_at(&self, at: Coordinates, filter: Option<Direction>) -> Option<&Question> {
        let mut matches = self
            .questions
            .iter()
            .zip(&self.answer_maps)
            .filter(|(q, _)| filter.is_none_or(|d| q.direction() == d))
            .filter(|(_, map)| map.contains(at))
            .map(|(q, _)| q);
        let first = matches.next()?;
        match matches.next() {
            Some(_) => None,
            None => Some(first),
        }
    }
}
