//! Crossword - command-line entry point.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use crossword_core::Puzzle;
use crossword_server::{ClientReplica, CrosswordRepository, PuzzleFile, ServerConfig, SessionHub};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = ServerConfig::load(Some(cli.config.as_path()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Validate { puzzle } => validate(&config, &puzzle),
        Command::Import { puzzle, game } => import(&config, &puzzle, &game),
        Command::Board { game, session } => board(&config, &game, &session).await,
    }
}

fn load_puzzle_file(config: &ServerConfig, path: &Path) -> Result<(PuzzleFile, Puzzle)> {
    let path = config.puzzle_path(path);
    let file = PuzzleFile::from_file(&path)?;
    let puzzle = file
        .to_puzzle()
        .with_context(|| format!("Invalid puzzle in {}", path.display()))?;
    Ok((file, puzzle))
}

fn open_repository(config: &ServerConfig) -> Result<CrosswordRepository> {
    let repository = CrosswordRepository::new(config.database_url().clone())?;
    repository.migrate()?;
    Ok(repository)
}

/// Validate a puzzle file and print its empty grid.
#[instrument(skip(config))]
fn validate(config: &ServerConfig, path: &Path) -> Result<()> {
    let (file, puzzle) = load_puzzle_file(config, path)?;
    let board = crossword_core::BoardState::from_log(&puzzle, &crossword_core::ActionLog::new());

    println!("{} ({}x{}, {} questions)", file.title(), puzzle.size().x, puzzle.size().y, puzzle.questions().len());
    println!("{}", board.display());
    for intersection in puzzle.intersections() {
        let owners: Vec<_> = intersection.cells.iter().map(|c| c.question_id()).collect();
        println!("crossing at {}: {}", intersection.at, owners.join(" / "));
    }
    info!("Puzzle valid");
    Ok(())
}

/// Import a puzzle file's questions into the database.
#[instrument(skip(config))]
fn import(config: &ServerConfig, path: &Path, game: &str) -> Result<()> {
    let (file, puzzle) = load_puzzle_file(config, path)?;
    let repository = open_repository(config)?;
    let stored = repository.insert_questions(game, puzzle.questions())?;
    println!("Imported {} questions of '{}' as game '{}'", stored, file.title(), game);
    Ok(())
}

/// Replay a stored session through a replica and print the board.
#[instrument(skip(config))]
async fn board(config: &ServerConfig, game: &str, session: &str) -> Result<()> {
    let repository = open_repository(config)?;
    let questions = repository.load_questions(game)?;
    anyhow::ensure!(!questions.is_empty(), "No questions stored for game '{}'", game);
    let puzzle = Arc::new(Puzzle::new(questions).with_context(|| format!("Stored game '{}' is invalid", game))?);

    let hub = SessionHub::with_repository(repository);
    let mut replica = ClientReplica::new(Arc::clone(&puzzle), session);
    let mut subscription = replica.connect(&hub).await?;
    let applied = replica.drain_ready(&mut subscription)?;
    info!(applied, "Session replayed");

    let board = replica.board();
    println!("{}", board.display());
    for (question, map) in puzzle.questions().iter().zip(puzzle.answer_maps()) {
        println!(
            "{:>4} {:<6} {:<8} {}",
            question.id(),
            question.direction(),
            board.question_progress(map),
            question.clue()
        );
    }
    if board.is_complete() {
        println!("Solved");
    }
    Ok(())
}
