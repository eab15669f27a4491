//! Correctness checking for a submitted answer.
//!
//! An answer is judged as a whole: every action of the submission gets the
//! same verdict, never a per-cell mix.

use crate::action::{ActionKind, GameAction};
use crate::answer_map::AnswerMap;
use tracing::{debug, instrument};

/// Returns true iff each action's value equals the expected character of the
/// answer map cell at the same index.
///
/// Comparison is exact, with no case or whitespace normalization. A candidate
/// list whose length differs from the answer map is never correct.
#[instrument(skip(map, actions), fields(question_id = %map.question_id(), cells = map.len(), actions = actions.len()))]
pub fn check_answer(map: &AnswerMap, actions: &[GameAction]) -> bool {
    let correct = map.len() == actions.len()
        && map
            .cells()
            .iter()
            .zip(actions)
            .all(|(cell, action)| cell.accepts(action.state()));
    debug!(correct, "Answer checked");
    correct
}

/// Returns the verdict kind for a candidate answer.
pub fn verdict(map: &AnswerMap, actions: &[GameAction]) -> ActionKind {
    if check_answer(map, actions) {
        ActionKind::CorrectGuess
    } else {
        ActionKind::IncorrectGuess
    }
}

/// Judges a guess and relabels every action with the single verdict.
pub fn judge(map: &AnswerMap, actions: &mut [GameAction]) -> ActionKind {
    let kind = verdict(map, actions);
    for action in actions.iter_mut() {
        action.set_kind(kind);
    }
    kind
}
