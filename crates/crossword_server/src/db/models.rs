//! Row models and their conversions to engine types.

use chrono::NaiveDateTime;
use crossword_core::{
    ActionKind, BatchKey, Coordinates, Direction, GameAction, Question, Sequence,
};
use derive_getters::Getters;
use diesel::prelude::*;
use tracing::instrument;
use uuid::Uuid;

use crate::db::{DbError, schema};

/// Stored question of one game, in puzzle order.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Getters)]
#[diesel(table_name = schema::questions)]
pub struct QuestionRow {
    game_id: String,
    question_id: String,
    position: i32,
    clue: String,
    answer: String,
    start_x: i64,
    start_y: i64,
    direction: String,
}

impl QuestionRow {
    /// Builds the row for `question` at `position` within game `game_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the position does not fit the column.
    #[instrument(skip(question), fields(question_id = %question.id()))]
    pub fn from_question(game_id: &str, position: usize, question: &Question) -> Result<Self, DbError> {
        Ok(Self {
            game_id: game_id.to_string(),
            question_id: question.id().to_string(),
            position: i32::try_from(position)
                .map_err(|_| DbError::new(format!("Question position {} out of range", position)))?,
            clue: question.clue().to_string(),
            answer: question.answer().to_string(),
            start_x: question.start_x(),
            start_y: question.start_y(),
            direction: question.direction().to_string(),
        })
    }

    /// Converts the row back into a question.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the stored direction is not `ACROSS` or `DOWN`.
    #[instrument(skip(self), fields(question_id = %self.question_id))]
    pub fn into_question(self) -> Result<Question, DbError> {
        let direction: Direction = self.direction.parse().map_err(|e| {
            DbError::new(format!("Invalid direction '{}': {}", self.direction, e))
        })?;
        Ok(Question::new(
            self.question_id,
            self.clue,
            self.answer,
            self.start_x,
            self.start_y,
            direction,
        ))
    }
}

/// Stored committed action.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Getters)]
#[diesel(table_name = schema::game_actions)]
pub struct ActionRow {
    session_id: String,
    sequence: i64,
    action_id: String,
    batch_key: String,
    x: i64,
    y: i64,
    kind: String,
    previous_state: String,
    state: String,
    actor_id: String,
    submitted_at: NaiveDateTime,
}

impl ActionRow {
    /// Builds the row for a committed action submitted under `batch_key`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the action has no sequence or the sequence
    /// overflows the column.
    #[instrument(skip(action), fields(action_id = %action.id()))]
    pub fn from_action(batch_key: BatchKey, action: &GameAction) -> Result<Self, DbError> {
        let sequence = action
            .sequence()
            .ok_or_else(|| DbError::new(format!("Action {} has no sequence", action.id())))?;
        Ok(Self {
            session_id: action.session_id().to_string(),
            sequence: i64::try_from(sequence)
                .map_err(|_| DbError::new(format!("Sequence {} out of range", sequence)))?,
            action_id: action.id().to_string(),
            batch_key: batch_key.to_string(),
            x: i64::from(action.coordinates().x),
            y: i64::from(action.coordinates().y),
            kind: action.kind().to_string(),
            previous_state: action.previous_state().to_string(),
            state: action.state().to_string(),
            actor_id: action.actor_id().to_string(),
            submitted_at: action.submitted_at().naive_utc(),
        })
    }

    /// Returns the parsed batch key.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the stored key is not a UUID.
    pub fn parsed_batch_key(&self) -> Result<BatchKey, DbError> {
        Uuid::parse_str(&self.batch_key)
            .map(BatchKey::from)
            .map_err(|e| DbError::new(format!("Invalid batch key '{}': {}", self.batch_key, e)))
    }

    /// Converts the row back into a committed action.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] for a malformed id, kind or coordinate.
    #[instrument(skip(self), fields(sequence = self.sequence))]
    pub fn into_action(self) -> Result<GameAction, DbError> {
        let id = Uuid::parse_str(&self.action_id)
            .map_err(|e| DbError::new(format!("Invalid action id '{}': {}", self.action_id, e)))?;
        let kind: ActionKind = self
            .kind
            .parse()
            .map_err(|e| DbError::new(format!("Invalid action kind '{}': {}", self.kind, e)))?;
        let coordinate = |value: i64| {
            u32::try_from(value).map_err(|_| DbError::new(format!("Coordinate {} out of range", value)))
        };
        let at = Coordinates::new(coordinate(self.x)?, coordinate(self.y)?);
        let sequence = Sequence::try_from(self.sequence)
            .map_err(|_| DbError::new(format!("Negative sequence {}", self.sequence)))?;

        Ok(GameAction::restore(
            id,
            at,
            kind,
            self.previous_state,
            self.state,
            self.submitted_at.and_utc(),
            self.actor_id,
            self.session_id,
            Some(sequence),
        ))
    }
}
