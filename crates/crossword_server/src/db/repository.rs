//! Database repository for puzzles and session action logs.

use crossword_core::{ActionBatch, BatchKey, GameAction, Question};
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument, warn};

use crate::db::{ActionRow, DbError, QuestionRow, schema};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Database repository for question and action persistence.
#[derive(Debug, Clone)]
pub struct CrosswordRepository {
    db_path: String,
}

impl CrosswordRepository {
    /// Creates a repository for the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        if db_path.trim().is_empty() {
            return Err(DbError::new("Database path is empty"));
        }
        info!(path = %db_path, "Creating CrosswordRepository");
        Ok(Self { db_path })
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))
    }

    /// Applies pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn migrate(&self) -> Result<usize, DbError> {
        let mut conn = self.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(format!("Migration failed: {}", e)))?;
        info!(applied = applied.len(), "Migrations applied");
        Ok(applied.len())
    }

    /// Stores the questions of a game, replacing any previous import.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs; nothing is written then.
    #[instrument(skip(self, questions), fields(count = questions.len()))]
    pub fn insert_questions(&self, game_id: &str, questions: &[Question]) -> Result<usize, DbError> {
        let rows = questions
            .iter()
            .enumerate()
            .map(|(position, q)| QuestionRow::from_question(game_id, position, q))
            .collect::<Result<Vec<_>, _>>()?;

        let mut conn = self.connection()?;
        let inserted = conn.transaction::<_, DbError, _>(|conn| {
            let removed = diesel::delete(
                schema::questions::table.filter(schema::questions::game_id.eq(game_id)),
            )
            .execute(conn)?;
            if removed > 0 {
                debug!(removed, "Replacing previous import");
            }
            Ok(diesel::insert_into(schema::questions::table)
                .values(&rows)
                .execute(conn)?)
        })?;

        info!(game_id, inserted, "Questions stored");
        Ok(inserted)
    }

    /// Loads the questions of a game in puzzle order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs or a row is malformed.
    #[instrument(skip(self))]
    pub fn load_questions(&self, game_id: &str) -> Result<Vec<Question>, DbError> {
        let mut conn = self.connection()?;
        let rows = schema::questions::table
            .filter(schema::questions::game_id.eq(game_id))
            .order(schema::questions::position.asc())
            .select(QuestionRow::as_select())
            .load(&mut conn)?;

        info!(game_id, count = rows.len(), "Questions loaded");
        rows.into_iter().map(QuestionRow::into_question).collect()
    }

    /// Appends a committed batch to its session's log.
    ///
    /// Idempotent per batch key: a key already stored appends nothing and
    /// returns 0. All rows are written in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if an action is unsequenced, belongs to another
    /// session, or a database error occurs.
    #[instrument(skip(self, actions), fields(count = actions.len()))]
    pub fn append_actions(
        &self,
        session_id: &str,
        batch_key: BatchKey,
        actions: &[GameAction],
    ) -> Result<usize, DbError> {
        if let Some(foreign) = actions.iter().find(|a| a.session_id() != session_id) {
            warn!(action_id = %foreign.id(), "Action from another session");
            return Err(DbError::new(format!(
                "Action {} belongs to session '{}', not '{}'",
                foreign.id(),
                foreign.session_id(),
                session_id
            )));
        }
        let rows = actions
            .iter()
            .map(|a| ActionRow::from_action(batch_key, a))
            .collect::<Result<Vec<_>, _>>()?;
        let key = batch_key.to_string();

        let mut conn = self.connection()?;
        let appended = conn.transaction::<_, DbError, _>(|conn| {
            let seen: i64 = schema::game_actions::table
                .filter(schema::game_actions::session_id.eq(session_id))
                .filter(schema::game_actions::batch_key.eq(&key))
                .count()
                .get_result(conn)?;
            if seen > 0 {
                debug!(batch_key = %key, "Batch already stored");
                return Ok(0);
            }
            Ok(diesel::insert_into(schema::game_actions::table)
                .values(&rows)
                .execute(conn)?)
        })?;

        if appended > 0 {
            info!(session_id, batch_key = %key, appended, "Actions stored");
        }
        Ok(appended)
    }

    /// Loads a session's committed log, grouped into its original batches in
    /// sequence order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs or a row is malformed.
    #[instrument(skip(self))]
    pub fn load_actions(&self, session_id: &str) -> Result<Vec<ActionBatch>, DbError> {
        let mut conn = self.connection()?;
        let rows = schema::game_actions::table
            .filter(schema::game_actions::session_id.eq(session_id))
            .order(schema::game_actions::sequence.asc())
            .select(ActionRow::as_select())
            .load(&mut conn)?;
        let count = rows.len();

        let mut batches: Vec<(BatchKey, Vec<GameAction>)> = Vec::new();
        for row in rows {
            let key = row.parsed_batch_key()?;
            let action = row.into_action()?;
            match batches.last_mut() {
                Some((last, actions)) if *last == key => actions.push(action),
                _ => batches.push((key, vec![action])),
            }
        }

        info!(session_id, count, batches = batches.len(), "Actions loaded");
        Ok(batches
            .into_iter()
            .map(|(key, actions)| {
                let actor = actions
                    .first()
                    .map(|a| a.actor_id().to_string())
                    .unwrap_or_default();
                ActionBatch::new(session_id, actor, key, actions)
            })
            .collect())
    }
}
