//! Unit step invariant: consecutive cells are adjacent along the direction.

use super::Invariant;
use crate::Puzzle;

/// Invariant: consecutive answer map cells differ by exactly one unit step
/// along the question's direction.
pub struct UnitStepInvariant;

impl Invariant<Puzzle> for UnitStepInvariant {
    fn holds(puzzle: &Puzzle) -> bool {
        puzzle.answer_maps().iter().all(|map| {
            let (dx, dy) = map.direction().step();
            map.cells().windows(2).all(|pair| {
                let a = pair[0].coordinates();
                let b = pair[1].coordinates();
                i64::from(b.x) - i64::from(a.x) == dx && i64::from(b.y) - i64::from(a.y) == dy
            })
        })
    }

    fn description() -> &'static str {
        "Consecutive answer cells are one unit step apart"
    }
}
