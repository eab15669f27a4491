//! Client-local selection state machine.
//!
//! Governs which question is focused, buffers in-progress edits, and decides
//! when to commit them. Edits never leave the buffer until a submission, and a
//! changed buffer is always flushed before the selection is cleared.
//!
//! ```text
//! Unselected --select--> Selected --edit--> Editing
//!      ^                     |                 |
//!      +----- un_select -----+----- un_select -+ (autosave if changed)
//! ```

use crate::action::{ActionKind, BatchKey, GameAction, SubmitKind};
use crate::board_state::BoardState;
use crate::checker;
use crate::error::CrosswordError;
use crate::puzzle::Puzzle;
use crate::transport::{ActionBatch, ActionTransport};
use crate::types::{ActorId, Coordinates, Direction, Question, QuestionId, SessionId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Observable phase of a [`Selection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum SelectionPhase {
    /// No question focused.
    Unselected,
    /// A question is focused and its buffer matches the seed values.
    Selected,
    /// The buffer holds at least one unsaved change.
    Editing,
}

#[derive(Debug, Clone)]
struct ActiveQuestion {
    question_id: QuestionId,
    pending: Vec<GameAction>,
}

impl ActiveQuestion {
    fn has_changes(&self) -> bool {
        self.pending.iter().any(GameAction::is_change)
    }
}

/// Selection and edit buffer for one player in one session.
#[derive(Debug)]
pub struct Selection {
    puzzle: Arc<Puzzle>,
    transport: Arc<dyn ActionTransport>,
    session_id: SessionId,
    actor_id: ActorId,
    direction: Option<Direction>,
    active: Option<ActiveQuestion>,
    unacknowledged: Option<ActionBatch>,
}

impl Selection {
    /// Creates an unselected state machine with the across filter active.
    #[instrument(skip(puzzle, transport, session_id, actor_id))]
    pub fn new(
        puzzle: Arc<Puzzle>,
        transport: Arc<dyn ActionTransport>,
        session_id: impl Into<SessionId>,
        actor_id: impl Into<ActorId>,
    ) -> Self {
        Self {
            puzzle,
            transport,
            session_id: session_id.into(),
            actor_id: actor_id.into(),
            direction: Some(Direction::Across),
            active: None,
            unacknowledged: None,
        }
    }

    /// Returns the current phase.
    pub fn phase(&self) -> SelectionPhase {
        match &self.active {
            None => SelectionPhase::Unselected,
            Some(active) if active.has_changes() => SelectionPhase::Editing,
            Some(_) => SelectionPhase::Selected,
        }
    }

    /// Returns the active direction filter; `None` shows all questions.
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// Returns the focused question.
    pub fn selected_question(&self) -> Option<&Question> {
        self.active
            .as_ref()
            .and_then(|a| self.puzzle.question(&a.question_id))
    }

    /// Returns the edit buffer, aligned with the focused answer map.
    pub fn pending_actions(&self) -> &[GameAction] {
        self.active.as_ref().map(|a| a.pending.as_slice()).unwrap_or(&[])
    }

    /// Returns questions visible under the active filter.
    pub fn filtered_questions(&self) -> Vec<&Question> {
        self.puzzle.questions_in(self.direction)
    }

    /// Returns true if any buffered value differs from its seed.
    pub fn has_unsaved_edits(&self) -> bool {
        self.active.as_ref().is_some_and(ActiveQuestion::has_changes)
    }

    /// Focuses a question and seeds the buffer from the board.
    ///
    /// Unsaved edits of the previous selection are autosaved first; the
    /// autosaved batch is returned so the caller can record it locally.
    ///
    /// # Errors
    ///
    /// [`CrosswordError::UnknownQuestion`] for an id outside the puzzle, or a
    /// transport error from the autosave (the previous buffer is kept).
    #[instrument(skip(self, board), fields(session_id = %self.session_id, actor_id = %self.actor_id))]
    pub async fn select_question(
        &mut self,
        question_id: &str,
        board: &BoardState,
    ) -> Result<Option<ActionBatch>, CrosswordError> {
        let puzzle = Arc::clone(&self.puzzle);
        let map = puzzle
            .answer_map(question_id)
            .ok_or_else(|| CrosswordError::UnknownQuestion(question_id.to_string()))?;

        let flushed = self.flush().await?;
        let saved: HashMap<Coordinates, &str> = flushed
            .iter()
            .flat_map(|b| b.actions())
            .map(|a| (a.coordinates(), a.state()))
            .collect();

        let pending = map
            .cells()
            .iter()
            .map(|cell| {
                let at = cell.coordinates();
                let seed = saved
                    .get(&at)
                    .copied()
                    .unwrap_or_else(|| board.value_at(at));
                GameAction::new(
                    at,
                    ActionKind::Placeholder,
                    seed,
                    seed,
                    self.actor_id.clone(),
                    self.session_id.clone(),
                )
            })
            .collect::<Vec<_>>();

        debug!(cells = pending.len(), "Edit buffer seeded");
        self.active = Some(ActiveQuestion {
            question_id: question_id.to_string(),
            pending,
        });
        Ok(flushed)
    }

    /// Focuses the question under the active filter that covers `(x, y)`.
    ///
    /// With no filter the cell must belong to exactly one question; a crossing
    /// needs a direction to pick between its two owners.
    ///
    /// # Errors
    ///
    /// [`CrosswordError::NoMatchingQuestion`] unless exactly one visible
    /// question covers the coordinate, otherwise as [`Selection::select_question`].
    #[instrument(skip(self, board))]
    pub async fn select_coordinates(
        &mut self,
        x: u32,
        y: u32,
        board: &BoardState,
    ) -> Result<Option<ActionBatch>, CrosswordError> {
        let at = Coordinates::new(x, y);
        let question_id = self
            .puzzle
            .question_at(at, self.direction)
            .map(|q| q.id().to_string())
            .ok_or_else(|| {
                warn!(%at, filter = ?self.direction, "No unique question under filter covers coordinate");
                CrosswordError::NoMatchingQuestion {
                    at,
                    filter: self.direction,
                }
            })?;
        self.select_question(&question_id, board).await
    }

    /// Sets a buffered value. Local only; nothing is sent.
    ///
    /// # Errors
    ///
    /// [`CrosswordError::NoPendingEdits`] without a selection,
    /// [`CrosswordError::CellNotFound`] outside the focused answer.
    #[instrument(skip(self, value))]
    pub fn edit(&mut self, x: u32, y: u32, value: impl Into<String>) -> Result<(), CrosswordError> {
        let at = Coordinates::new(x, y);
        let active = self.active.as_mut().ok_or(CrosswordError::NoPendingEdits)?;
        let entry = active
            .pending
            .iter_mut()
            .find(|a| a.coordinates() == at)
            .ok_or(CrosswordError::CellNotFound(at))?;
        entry.set_state(value.into());
        debug!(%at, value = %entry.state(), "Buffered edit");
        Ok(())
    }

    /// Submits the buffer for the focused question.
    ///
    /// A guess is judged as a whole and every action relabeled with the
    /// verdict. The batch is handed to the transport tagged with this
    /// player's and session's ids; on success the buffer's seeds are rebased
    /// to the submitted values. A failed batch is kept and re-sent with the
    /// same key if the next submission carries the same content.
    ///
    /// # Errors
    ///
    /// [`CrosswordError::NoPendingEdits`] without a selection, or the
    /// transport error.
    #[instrument(skip(self), fields(session_id = %self.session_id, actor_id = %self.actor_id))]
    pub async fn submit_actions(&mut self, kind: SubmitKind) -> Result<ActionBatch, CrosswordError> {
        let active = self.active.as_ref().ok_or(CrosswordError::NoPendingEdits)?;
        if active.pending.is_empty() {
            return Err(CrosswordError::NoPendingEdits);
        }

        let mut actions: Vec<GameAction> = active
            .pending
            .iter()
            .map(|a| a.stamped(kind.into()))
            .collect();
        if kind == SubmitKind::Guess {
            let map = self
                .puzzle
                .answer_map(&active.question_id)
                .ok_or_else(|| CrosswordError::UnknownQuestion(active.question_id.clone()))?;
            let verdict = checker::judge(map, &mut actions);
            info!(question_id = %active.question_id, %verdict, "Guess judged");
        }

        let batch = match self.unacknowledged.take() {
            Some(previous) if same_content(previous.actions(), &actions) => {
                debug!(batch_key = %previous.batch_key(), "Retrying unacknowledged batch");
                previous
            }
            _ => ActionBatch::new(
                self.session_id.clone(),
                self.actor_id.clone(),
                BatchKey::generate(),
                actions,
            ),
        };

        match self.transport.submit(batch.clone()).await {
            Ok(ack) => {
                info!(
                    batch_key = %ack.batch_key,
                    first = ack.first_sequence,
                    last = ack.last_sequence,
                    replayed = ack.replayed,
                    "Batch submitted"
                );
                if let Some(active) = self.active.as_mut() {
                    active.pending.iter_mut().for_each(GameAction::rebase);
                }
                Ok(batch)
            }
            Err(e) => {
                warn!(error = %e, batch_key = %batch.batch_key(), "Submission failed, keeping edits");
                self.unacknowledged = Some(batch);
                Err(e.into())
            }
        }
    }

    /// Clears the selection, autosaving changed edits as placeholders first.
    ///
    /// Returns the autosaved batch, or `None` when nothing changed (no
    /// network effect in that case).
    ///
    /// # Errors
    ///
    /// The transport error; the selection is kept so no edit is lost.
    #[instrument(skip(self))]
    pub async fn un_select(&mut self) -> Result<Option<ActionBatch>, CrosswordError> {
        let flushed = self.flush().await?;
        if self.active.take().is_some() {
            debug!("Selection cleared");
        }
        Ok(flushed)
    }

    /// Toggles the across filter.
    ///
    /// # Errors
    ///
    /// See [`Selection::un_select`].
    pub async fn filter_across(&mut self) -> Result<Option<ActionBatch>, CrosswordError> {
        self.toggle_filter(Direction::Across).await
    }

    /// Toggles the down filter.
    ///
    /// # Errors
    ///
    /// See [`Selection::un_select`].
    pub async fn filter_down(&mut self) -> Result<Option<ActionBatch>, CrosswordError> {
        self.toggle_filter(Direction::Down).await
    }

    #[instrument(skip(self))]
    async fn toggle_filter(&mut self, direction: Direction) -> Result<Option<ActionBatch>, CrosswordError> {
        if self.direction == Some(direction) {
            debug!("Clearing direction filter");
            self.direction = None;
            return Ok(None);
        }
        let flushed = self.un_select().await?;
        self.direction = Some(direction);
        info!(%direction, "Direction filter switched");
        Ok(flushed)
    }

    async fn flush(&mut self) -> Result<Option<ActionBatch>, CrosswordError> {
        if self.has_unsaved_edits() {
            debug!("Autosaving changed edits");
            self.submit_actions(SubmitKind::Placeholder).await.map(Some)
        } else {
            Ok(None)
        }
    }
}

fn same_content(previous: &[GameAction], next: &[GameAction]) -> bool {
    previous.len() == next.len()
        && previous.iter().zip(next).all(|(a, b)| {
            a.coordinates() == b.coordinates()
                && a.kind() == b.kind()
                && a.state() == b.state()
                && a.previous_state() == b.previous_state()
        })
}
