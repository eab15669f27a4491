//! Command-line interface for the crossword binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Crossword - multiplayer crossword board engine
#[derive(Parser, Debug)]
#[command(name = "crossword")]
#[command(about = "Validate, import and inspect crossword games", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the server configuration file
    #[arg(short, long, global = true, default_value = "crossword.toml")]
    pub config: PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check a puzzle file's geometry and print the empty grid
    Validate {
        /// Puzzle file (TOML)
        #[arg(short, long)]
        puzzle: PathBuf,
    },

    /// Store a puzzle file's questions under a game id
    Import {
        /// Puzzle file (TOML)
        #[arg(short, long)]
        puzzle: PathBuf,

        /// Game id to store the questions under
        #[arg(short, long)]
        game: String,
    },

    /// Reduce a session's stored log and print the board
    Board {
        /// Game id holding the questions
        #[arg(short, long)]
        game: String,

        /// Session id holding the actions
        #[arg(short, long)]
        session: String,
    },
}
