//! Intersection agreement invariant: crossing answers share their letter.

use super::Invariant;
use crate::geometry::intersections;
use crate::Puzzle;

/// Invariant: every coordinate owned by several questions expects a single character.
///
/// A disagreement is a puzzle-authoring defect.
pub struct IntersectionsAgreeInvariant;

impl Invariant<Puzzle> for IntersectionsAgreeInvariant {
    fn holds(puzzle: &Puzzle) -> bool {
        intersections(puzzle.answer_maps())
            .iter()
            .all(|crossing| crossing.agrees())
    }

    fn description() -> &'static str {
        "Crossing answers expect the same character at shared cells"
    }
}
