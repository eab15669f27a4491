//! Client-side replica of one session.
//!
//! A replica owns the puzzle and its copy of the action log. Committed batches
//! arrive through a [`Subscription`] and are applied in an explicit loop; local
//! submissions are recorded optimistically. Every change recomputes the board
//! and publishes it on a watch channel.

use crossword_core::{
    ActionBatch, ActionLog, ActionTransport, BoardState, CrosswordError, Puzzle, SessionId,
    Subscription,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

/// One client's view of a session.
#[derive(Debug)]
pub struct ClientReplica {
    puzzle: Arc<Puzzle>,
    session_id: SessionId,
    log: ActionLog,
    snapshot: watch::Sender<BoardState>,
}

impl ClientReplica {
    /// Creates a replica with an empty log.
    #[instrument(skip(puzzle, session_id))]
    pub fn new(puzzle: Arc<Puzzle>, session_id: impl Into<SessionId>) -> Self {
        let log = ActionLog::new();
        let (snapshot, _) = watch::channel(BoardState::from_log(&puzzle, &log));
        Self {
            puzzle,
            session_id: session_id.into(),
            log,
            snapshot,
        }
    }

    /// Returns the puzzle.
    pub fn puzzle(&self) -> &Arc<Puzzle> {
        &self.puzzle
    }

    /// Returns the session id.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Returns the local action log.
    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    /// Returns the current board.
    pub fn board(&self) -> BoardState {
        self.snapshot.borrow().clone()
    }

    /// Returns a receiver notified on every board change.
    pub fn watch(&self) -> watch::Receiver<BoardState> {
        self.snapshot.subscribe()
    }

    fn publish(&self) {
        let board = BoardState::from_log(&self.puzzle, &self.log);
        self.snapshot.send_replace(board);
    }

    /// Applies a committed batch. Returns how many actions were new.
    ///
    /// # Errors
    ///
    /// Returns [`CrosswordError::UnsequencedAction`] for a batch that was
    /// never committed, and [`CrosswordError::SequenceGap`] when the feed
    /// skipped ahead; reconnect with [`ClientReplica::connect`] to replay
    /// from [`ActionLog::last_sequence`].
    #[instrument(skip(self, batch), fields(session_id = %self.session_id, batch_key = %batch.batch_key()))]
    pub fn apply(&mut self, batch: &ActionBatch) -> Result<usize, CrosswordError> {
        let appended = self.log.commit_batch(batch)?;
        if appended > 0 {
            self.publish();
        } else {
            debug!("Batch carried no new actions");
        }
        Ok(appended)
    }

    /// Records a local submission ahead of its commit.
    #[instrument(skip(self, batch), fields(session_id = %self.session_id, batch_key = %batch.batch_key()))]
    pub fn record_local(&mut self, batch: &ActionBatch) {
        self.log.record_pending(batch.actions().iter().cloned());
        self.publish();
    }

    /// Subscribes to the session from the last committed sequence, so only
    /// missing batches are replayed.
    ///
    /// # Errors
    ///
    /// Returns the transport error.
    #[instrument(skip(self, transport), fields(session_id = %self.session_id))]
    pub async fn connect(&self, transport: &dyn ActionTransport) -> Result<Subscription, CrosswordError> {
        let after = self.log.last_sequence();
        info!(after = ?after, "Subscribing");
        Ok(transport.subscribe(&self.session_id, after).await?)
    }

    /// Applies every batch already queued on the subscription.
    ///
    /// # Errors
    ///
    /// See [`ClientReplica::apply`].
    pub fn drain_ready(&mut self, subscription: &mut Subscription) -> Result<usize, CrosswordError> {
        let mut appended = 0;
        while let Some(batch) = subscription.try_next() {
            appended += self.apply(&batch)?;
        }
        Ok(appended)
    }

    /// Applies batches until the transport closes the subscription.
    ///
    /// # Errors
    ///
    /// See [`ClientReplica::apply`].
    #[instrument(skip(self, subscription), fields(session_id = %self.session_id))]
    pub async fn run(&mut self, subscription: &mut Subscription) -> Result<usize, CrosswordError> {
        let mut appended = 0;
        while let Some(batch) = subscription.next().await {
            appended += self.apply(&batch)?;
        }
        info!(appended, "Subscription closed");
        Ok(appended)
    }
}
