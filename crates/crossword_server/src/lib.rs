//! Crossword server - session hub, replicas and persistence
//!
//! Collaborators around the pure engine in `crossword_core`.
//!
//! # Architecture
//!
//! - **Hub**: in-process [`ActionTransport`](crossword_core::ActionTransport)
//!   that sequences, deduplicates and fans out batches
//! - **Replica**: a client's log and board snapshot fed by a subscription
//! - **Database**: SQLite storage for puzzles and committed logs
//! - **Puzzle files**: TOML puzzle definitions

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod hub;
mod puzzle_file;
mod replica;

pub mod db;

// Crate-level exports - Configuration
pub use config::{ConfigError, DATABASE_URL_ENV, ServerConfig};

// Crate-level exports - Sessions
pub use hub::SessionHub;
pub use replica::ClientReplica;

// Crate-level exports - Puzzle files
pub use puzzle_file::{PuzzleFile, QuestionEntry};

// Crate-level exports - Persistence
pub use db::{CrosswordRepository, DbError};
