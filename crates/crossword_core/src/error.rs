//! Errors raised by the board engine.

use crate::action::{ActionId, Sequence};
use crate::transport::TransportError;
use crate::types::{Coordinates, Direction, QuestionId};

/// Error that can occur while building, reducing or editing a board.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum CrosswordError {
    /// A question's answer cannot be placed on the grid.
    #[display("Invalid geometry for question {}: {}", question_id, reason)]
    InvalidQuestionGeometry {
        /// The offending question.
        question_id: QuestionId,
        /// What is wrong with it.
        reason: String,
    },

    /// No answer map contains the coordinate.
    #[display("No cell at {}", _0)]
    CellNotFound(Coordinates),

    /// No question under the active direction filter contains the coordinate.
    #[display("No question matching filter {:?} covers {}", filter, at)]
    NoMatchingQuestion {
        /// The requested coordinate.
        at: Coordinates,
        /// The active direction filter.
        filter: Option<Direction>,
    },

    /// Submit or edit invoked without a selected question.
    #[display("No pending edits")]
    NoPendingEdits,

    /// The question id is not part of the puzzle.
    #[display("Unknown question {}", _0)]
    UnknownQuestion(QuestionId),

    /// Two questions share an id.
    #[display("Duplicate question id {}", _0)]
    DuplicateQuestion(QuestionId),

    /// Two crossing answers expect different characters in the same cell.
    #[display(
        "Questions {} and {} disagree at {}: {:?} vs {:?}",
        first,
        second,
        at,
        first_expected,
        second_expected
    )]
    ConflictingIntersection {
        /// Shared coordinate.
        at: Coordinates,
        /// First owning question.
        first: QuestionId,
        /// Character the first question expects.
        first_expected: char,
        /// Second owning question.
        second: QuestionId,
        /// Character the second question expects.
        second_expected: char,
    },

    /// A committed batch contained an action without a server sequence.
    #[display("Action {} has no server sequence", _0)]
    UnsequencedAction(ActionId),

    /// A committed action arrived ahead of a missing sequence.
    #[display("Expected sequence {}, received {}", expected, received)]
    SequenceGap {
        /// Next sequence the log can accept.
        expected: Sequence,
        /// Sequence that arrived instead.
        received: Sequence,
    },

    /// A puzzle invariant was violated after construction.
    #[display("Invariant violation: {}", _0)]
    InvariantViolation(String),

    /// The submission channel failed.
    #[display("{}", _0)]
    Transport(TransportError),
}

impl std::error::Error for CrosswordError {}

impl From<TransportError> for CrosswordError {
    fn from(err: TransportError) -> Self {
        CrosswordError::Transport(err)
    }
}

impl CrosswordError {
    /// Returns true for errors caused by an interaction that does not hit puzzle geometry.
    ///
    /// These are reported back to the player and never retried.
    pub fn is_invalid_interaction(&self) -> bool {
        matches!(
            self,
            CrosswordError::CellNotFound(_) | CrosswordError::NoMatchingQuestion { .. }
        )
    }

    /// Returns true when the feed lost its place and must be re-subscribed
    /// from the log's last committed sequence.
    pub fn needs_resubscribe(&self) -> bool {
        matches!(self, CrosswordError::SequenceGap { .. })
    }
}
