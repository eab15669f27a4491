//! Crossword core - deterministic board state for multiplayer crosswords
//!
//! Every client folds the same ordered action log over the same puzzle
//! geometry and arrives at the same board.
//!
//! # Architecture
//!
//! - **Geometry**: answer maps, board size and cell resolution
//! - **Action log**: committed prefix plus optimistic pending tail
//! - **Reducer**: [`BoardState`] recomputed from the log on demand
//! - **Checker**: whole-answer verdicts for guesses
//! - **Selection**: per-player focus and edit buffer with autosave
//! - **Transport**: the [`ActionTransport`] seam to the outside world
//!
//! # Example
//!
//! ```
//! use crossword_core::{ActionLog, BoardState, Direction, Puzzle, Question};
//!
//! # fn example() -> Result<(), crossword_core::CrosswordError> {
//! let puzzle = Puzzle::new(vec![
//!     Question::new("1a", "feline", "CAT", 0, 0, Direction::Across),
//!     Question::new("1d", "solid", "CUBE", 0, 0, Direction::Down),
//! ])?;
//! let board = BoardState::from_log(&puzzle, &ActionLog::new());
//! assert_eq!(board.display(), "...\n.##\n.##\n.##");
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod action_log;
mod answer_map;
mod board_state;
mod error;
mod puzzle;
mod selection;
mod transport;
mod types;

pub mod checker;
pub mod geometry;
pub mod invariants;

// Crate-level exports - Geometry
pub use answer_map::AnswerMap;
pub use geometry::{Intersection, compute_board_size, resolve_cell, resolve_cells};
pub use puzzle::Puzzle;
pub use types::{ActorId, BoardSize, Cell, Coordinates, Direction, Question, QuestionId, SessionId};

// Crate-level exports - Actions and log
pub use action::{ActionId, ActionKind, BatchKey, GameAction, Sequence, SubmitKind};
pub use action_log::ActionLog;

// Crate-level exports - Reducer and checker
pub use board_state::{BoardState, CellState, QuestionProgress};
pub use checker::check_answer;

// Crate-level exports - Session
pub use selection::{Selection, SelectionPhase};
pub use transport::{ActionBatch, ActionTransport, SubmitAck, Subscription, TransportError};

// Crate-level exports - Errors
pub use error::CrosswordError;
