//! Answer length invariant: one cell per answer character.

use super::Invariant;
use crate::Puzzle;

/// Invariant: every answer map has exactly as many cells as its answer has characters.
pub struct AnswerLengthInvariant;

impl Invariant<Puzzle> for AnswerLengthInvariant {
    fn holds(puzzle: &Puzzle) -> bool {
        puzzle
            .questions()
            .iter()
            .zip(puzzle.answer_maps())
            .all(|(question, map)| {
                map.question_id() == question.id() && map.len() == question.answer().chars().count()
            })
    }

    fn description() -> &'static str {
        "Answer map length equals expected answer length"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Direction, Question};

    #[test]
    fn test_holds_for_mixed_lengths() {
        let puzzle = Puzzle::new(vec![
            Question::new("a", "one", "A", 4, 4, Direction::Across),
            Question::new("b", "long", "ABCDEFGH", 0, 0, Direction::Down),
        ])
        .unwrap();
        assert!(AnswerLengthInvariant::holds(&puzzle));
    }
}
