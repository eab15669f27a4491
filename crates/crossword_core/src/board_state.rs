//! Board state reducer: the visible grid folded from the action log.
//!
//! The board is never stored or patched. Every call recomputes it from the
//! puzzle and the full ordered log, so identical inputs give identical
//! output on every client.

use crate::action::GameAction;
use crate::action_log::ActionLog;
use crate::answer_map::AnswerMap;
use crate::puzzle::Puzzle;
use crate::types::{BoardSize, Coordinates, QuestionId};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Derived view of one grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellState {
    value: String,
    modifications: Vec<GameAction>,
    expected: char,
    questions: Vec<QuestionId>,
}

impl CellState {
    /// Returns the visible value, empty if never edited.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns every action at this cell in log order.
    pub fn modifications(&self) -> &[GameAction] {
        &self.modifications
    }

    /// Returns the most recent action at this cell.
    pub fn last_modification(&self) -> Option<&GameAction> {
        self.modifications.last()
    }

    /// Returns the expected character.
    pub fn expected(&self) -> char {
        self.expected
    }

    /// Returns the owning questions; two for a crossing.
    pub fn questions(&self) -> &[QuestionId] {
        &self.questions
    }

    /// Returns true if the visible value is the expected character.
    pub fn is_correct(&self) -> bool {
        let mut chars = self.value.chars();
        chars.next() == Some(self.expected) && chars.next().is_none()
    }
}

/// How far a single question has been answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
pub enum QuestionProgress {
    /// No cell has a value.
    Empty,
    /// Some cells have a value.
    Partial,
    /// Every cell has a value, not all correct.
    Filled,
    /// Every cell holds its expected character.
    Solved,
}

/// Per-coordinate view of the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardState {
    size: BoardSize,
    #[serde(serialize_with = "serialize_cells")]
    cells: BTreeMap<Coordinates, CellState>,
}

#[derive(Serialize)]
struct CellEntry<'a> {
    at: Coordinates,
    #[serde(flatten)]
    cell: &'a CellState,
}

fn serialize_cells<S: Serializer>(
    cells: &BTreeMap<Coordinates, CellState>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(cells.iter().map(|(at, cell)| CellEntry { at: *at, cell }))
}

impl BoardState {
    /// Folds the ordered actions over the answer map geometry.
    ///
    /// Each answer cell's history is the sub-sequence of `actions` at its
    /// coordinate, in the given order; its value is the last entry's state.
    /// Actions outside every answer map are ignored.
    #[instrument(skip(maps, actions))]
    pub fn from_actions<'a>(
        size: BoardSize,
        maps: &[AnswerMap],
        actions: impl IntoIterator<Item = &'a GameAction>,
    ) -> Self {
        let mut cells: BTreeMap<Coordinates, CellState> = BTreeMap::new();
        for cell in maps.iter().flat_map(|m| m.cells()) {
            let state = cells.entry(cell.coordinates()).or_insert_with(|| CellState {
                value: String::new(),
                modifications: Vec::new(),
                expected: cell.expected(),
                questions: Vec::new(),
            });
            state.questions.push(cell.question_id().to_string());
        }

        let mut ignored = 0usize;
        for action in actions {
            match cells.get_mut(&action.coordinates()) {
                Some(state) => state.modifications.push(action.clone()),
                None => ignored += 1,
            }
        }

        for state in cells.values_mut() {
            state.value = state
                .modifications
                .last()
                .map(|a| a.state().to_string())
                .unwrap_or_default();
        }

        debug!(cells = cells.len(), ignored, "Board state reduced");
        Self { size, cells }
    }

    /// Reduces a puzzle's full action log, committed prefix then pending tail.
    pub fn from_log(puzzle: &Puzzle, log: &ActionLog) -> Self {
        Self::from_actions(puzzle.size(), puzzle.answer_maps(), log.ordered())
    }

    /// Returns the board size.
    pub fn size(&self) -> BoardSize {
        self.size
    }

    /// Returns the state of one cell, `None` for a blocked square.
    pub fn cell(&self, at: Coordinates) -> Option<&CellState> {
        self.cells.get(&at)
    }

    /// Returns the visible value at a coordinate, empty for blocked or untouched squares.
    pub fn value_at(&self, at: Coordinates) -> &str {
        self.cells.get(&at).map(CellState::value).unwrap_or("")
    }

    /// Iterates all answer cells in coordinate order.
    pub fn cells(&self) -> impl Iterator<Item = (&Coordinates, &CellState)> {
        self.cells.iter()
    }

    /// Returns how far one question has been answered.
    pub fn question_progress(&self, map: &AnswerMap) -> QuestionProgress {
        let states: Vec<_> = map
            .cells()
            .iter()
            .filter_map(|c| self.cells.get(&c.coordinates()))
            .collect();
        if states.iter().all(|s| s.is_correct()) {
            QuestionProgress::Solved
        } else if states.iter().all(|s| !s.value.is_empty()) {
            QuestionProgress::Filled
        } else if states.iter().any(|s| !s.value.is_empty()) {
            QuestionProgress::Partial
        } else {
            QuestionProgress::Empty
        }
    }

    /// Returns true if every answer cell shows its expected character.
    pub fn is_complete(&self) -> bool {
        self.cells.values().all(CellState::is_correct)
    }

    /// Plain text dump of the grid: `#` blocked, `.` empty, otherwise the value.
    pub fn display(&self) -> String {
        let mut rows = Vec::with_capacity(self.size.y as usize);
        for y in 0..self.size.y {
            let row: String = (0..self.size.x)
                .map(|x| match self.cells.get(&Coordinates::new(x, y)) {
                    None => '#',
                    Some(state) => state.value.chars().next().unwrap_or('.'),
                })
                .collect();
            rows.push(row);
        }
        rows.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;
    use crate::types::{Direction, Question};

    fn puzzle() -> Puzzle {
        Puzzle::new(vec![
            Question::new("1a", "feline", "CAT", 0, 0, Direction::Across),
            Question::new("1d", "solid", "CUBE", 0, 0, Direction::Down),
        ])
        .unwrap()
    }

    fn edit(x: u32, y: u32, state: &str) -> GameAction {
        GameAction::new(Coordinates::new(x, y), ActionKind::Placeholder, "", state, "alice", "s1")
    }

    #[test]
    fn test_empty_log_gives_empty_cells() {
        let puzzle = puzzle();
        let board = BoardState::from_log(&puzzle, &ActionLog::new());
        assert_eq!(board.cells().count(), 6);
        assert!(board.cells().all(|(_, c)| c.value().is_empty()));
        assert_eq!(board.display(), "...\n.##\n.##\n.##");
    }

    #[test]
    fn test_last_action_in_log_order_wins() {
        let puzzle = puzzle();
        let actions = vec![edit(1, 0, "X"), edit(1, 0, "A")];
        let board = BoardState::from_actions(puzzle.size(), puzzle.answer_maps(), &actions);
        let cell = board.cell(Coordinates::new(1, 0)).unwrap();
        assert_eq!(cell.value(), "A");
        assert_eq!(cell.modifications().len(), 2);
    }

    #[test]
    fn test_crossing_cell_lists_both_questions() {
        let puzzle = puzzle();
        let board = BoardState::from_log(&puzzle, &ActionLog::new());
        let cell = board.cell(Coordinates::new(0, 0)).unwrap();
        assert_eq!(cell.questions(), &["1a".to_string(), "1d".to_string()]);
    }

    #[test]
    fn test_actions_off_grid_are_ignored() {
        let puzzle = puzzle();
        let actions = vec![edit(2, 2, "Z")];
        let board = BoardState::from_actions(puzzle.size(), puzzle.answer_maps(), &actions);
        assert!(board.cell(Coordinates::new(2, 2)).is_none());
        assert_eq!(board.value_at(Coordinates::new(2, 2)), "");
    }

    #[test]
    fn test_progress_and_completion() {
        let puzzle = puzzle();
        let across = puzzle.answer_map("1a").unwrap();
        let mut actions = vec![edit(0, 0, "C"), edit(1, 0, "A")];
        let board = BoardState::from_actions(puzzle.size(), puzzle.answer_maps(), &actions);
        assert_eq!(board.question_progress(across), QuestionProgress::Partial);

        actions.push(edit(2, 0, "X"));
        let board = BoardState::from_actions(puzzle.size(), puzzle.answer_maps(), &actions);
        assert_eq!(board.question_progress(across), QuestionProgress::Filled);

        actions.push(edit(2, 0, "T"));
        let board = BoardState::from_actions(puzzle.size(), puzzle.answer_maps(), &actions);
        assert_eq!(board.question_progress(across), QuestionProgress::Solved);
        assert!(!board.is_complete());

        for (y, letter) in [(1, "U"), (2, "B"), (3, "E")] {
            actions.push(edit(0, y, letter));
        }
        let board = BoardState::from_actions(puzzle.size(), puzzle.answer_maps(), &actions);
        assert!(board.is_complete());
        assert_eq!(board.display(), "CAT\nU##\nB##\nE##");
    }
}
