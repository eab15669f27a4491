//! In-process session hub.
//!
//! The hub is the single writer of every session's log: it assigns sequence
//! numbers, remembers accepted batch keys, persists committed batches when a
//! repository is attached, and fans batches out to subscribers in commit
//! order.

use crate::db::{CrosswordRepository, DbError};
use crossword_core::{
    ActionBatch, ActionTransport, BatchKey, Sequence, SessionId, SubmitAck, Subscription,
    TransportError,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Committed state of one session.
#[derive(Debug, Default)]
struct SessionChannel {
    history: Vec<ActionBatch>,
    last_sequence: Option<Sequence>,
    accepted: HashMap<BatchKey, SubmitAck>,
    subscribers: Vec<mpsc::UnboundedSender<ActionBatch>>,
}

impl SessionChannel {
    fn restore(history: Vec<ActionBatch>) -> Self {
        let mut channel = Self::default();
        for batch in history {
            let (Some(first), Some(last)) = (
                batch.actions().first().and_then(|a| a.sequence()),
                batch.actions().last().and_then(|a| a.sequence()),
            ) else {
                continue;
            };
            channel.accepted.insert(
                batch.batch_key(),
                SubmitAck {
                    batch_key: batch.batch_key(),
                    first_sequence: first,
                    last_sequence: last,
                    replayed: false,
                },
            );
            channel.last_sequence = Some(last);
            channel.history.push(batch);
        }
        channel
    }

    fn next_sequence(&self) -> Sequence {
        self.last_sequence.map_or(1, |last| last + 1)
    }

    fn publish(&mut self, batch: &ActionBatch) {
        let before = self.subscribers.len();
        self.subscribers.retain(|tx| tx.send(batch.clone()).is_ok());
        let pruned = before - self.subscribers.len();
        if pruned > 0 {
            debug!(pruned, "Pruned closed subscribers");
        }
    }
}

/// Sequencing authority for all sessions in this process.
#[derive(Debug, Clone, Default)]
pub struct SessionHub {
    sessions: Arc<Mutex<HashMap<SessionId, SessionChannel>>>,
    commit: Arc<tokio::sync::Mutex<()>>,
    repository: Option<CrosswordRepository>,
}

impl SessionHub {
    /// Creates a hub that keeps logs in memory only.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating session hub");
        Self::default()
    }

    /// Creates a hub that persists committed batches and restores sessions
    /// from the repository on first use.
    #[instrument(skip(repository))]
    pub fn with_repository(repository: CrosswordRepository) -> Self {
        info!("Creating persistent session hub");
        Self {
            repository: Some(repository),
            ..Self::default()
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SessionId, SessionChannel>>, TransportError> {
        self.sessions
            .lock()
            .map_err(|_| TransportError::new("Session hub state poisoned"))
    }

    /// Runs a repository call on the blocking pool.
    async fn run_blocking<T, F>(&self, call: F) -> Result<Option<T>, TransportError>
    where
        T: Send + 'static,
        F: FnOnce(CrosswordRepository) -> Result<T, DbError> + Send + 'static,
    {
        let Some(repository) = self.repository.clone() else {
            return Ok(None);
        };
        let result = tokio::task::spawn_blocking(move || call(repository))
            .await
            .map_err(|e| TransportError::new(format!("Repository task failed: {}", e)))?;
        result
            .map(Some)
            .map_err(|e| TransportError::new(e.to_string()))
    }

    /// Loads a session into memory if it is not open yet.
    ///
    /// Stored history is read without holding the session map lock.
    async fn open(&self, session_id: &str) -> Result<(), TransportError> {
        if self.lock()?.contains_key(session_id) {
            return Ok(());
        }
        let owned = session_id.to_string();
        let channel = match self
            .run_blocking(move |repository| repository.load_actions(&owned))
            .await
            .map_err(|e| TransportError::new(format!("Failed to restore session: {}", e)))?
        {
            Some(history) => {
                info!(session_id, batches = history.len(), "Session restored");
                SessionChannel::restore(history)
            }
            None => {
                debug!(session_id, "Opening new session");
                SessionChannel::default()
            }
        };
        self.lock()?.entry(session_id.to_string()).or_insert(channel);
        Ok(())
    }

    fn channel<'a>(
        sessions: &'a mut HashMap<SessionId, SessionChannel>,
        session_id: &str,
    ) -> Result<&'a mut SessionChannel, TransportError> {
        sessions
            .get_mut(session_id)
            .ok_or_else(|| TransportError::new(format!("Session '{}' unavailable", session_id)))
    }

    /// Returns the committed batches of a session in commit order.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the session cannot be restored.
    #[instrument(skip(self))]
    pub async fn history(&self, session_id: &str) -> Result<Vec<ActionBatch>, TransportError> {
        self.open(session_id).await?;
        let mut sessions = self.lock()?;
        Ok(Self::channel(&mut sessions, session_id)?.history.clone())
    }

    /// Returns the last sequence committed in a session.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the session cannot be restored.
    #[instrument(skip(self))]
    pub async fn last_sequence(&self, session_id: &str) -> Result<Option<Sequence>, TransportError> {
        self.open(session_id).await?;
        let mut sessions = self.lock()?;
        Ok(Self::channel(&mut sessions, session_id)?.last_sequence)
    }

    /// Drops a finished session from memory and ends its subscriptions.
    ///
    /// Persisted history stays in the repository and is restored on next use.
    /// Returns false if the session was not open.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the hub state is poisoned.
    #[instrument(skip(self))]
    pub fn close_session(&self, session_id: &str) -> Result<bool, TransportError> {
        let closed = self.lock()?.remove(session_id);
        match &closed {
            Some(channel) => info!(
                subscribers = channel.subscribers.len(),
                batches = channel.history.len(),
                "Session closed"
            ),
            None => debug!("Session was not open"),
        }
        Ok(closed.is_some())
    }

    /// Number of sessions held in memory.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the hub state is poisoned.
    pub fn open_sessions(&self) -> Result<usize, TransportError> {
        Ok(self.lock()?.len())
    }
}

fn validate(batch: &ActionBatch) -> Result<(), TransportError> {
    if batch.actions().is_empty() {
        return Err(TransportError::new("Empty batch"));
    }
    for action in batch.actions() {
        if action.session_id() != batch.session_id() {
            return Err(TransportError::new(format!(
                "Action {} belongs to session '{}', batch targets '{}'",
                action.id(),
                action.session_id(),
                batch.session_id()
            )));
        }
        if action.actor_id() != batch.actor_id() {
            return Err(TransportError::new(format!(
                "Action {} was made by '{}', batch submitted by '{}'",
                action.id(),
                action.actor_id(),
                batch.actor_id()
            )));
        }
        if action.sequence().is_some() {
            return Err(TransportError::new(format!(
                "Action {} is already sequenced",
                action.id()
            )));
        }
    }
    Ok(())
}

#[async_trait::async_trait]
impl ActionTransport for SessionHub {
    #[instrument(skip(self, batch), fields(session_id = %batch.session_id(), actor_id = %batch.actor_id(), batch_key = %batch.batch_key()))]
    async fn submit(&self, batch: ActionBatch) -> Result<SubmitAck, TransportError> {
        validate(&batch).inspect_err(|e| warn!(error = %e, "Batch rejected"))?;

        // Held across persistence so no two batches draw the same sequences.
        let _commit = self.commit.lock().await;
        self.open(batch.session_id()).await?;

        let committed = {
            let mut sessions = self.lock()?;
            let channel = Self::channel(&mut sessions, batch.session_id())?;
            if let Some(ack) = channel.accepted.get(&batch.batch_key()) {
                info!("Batch key already accepted, replaying acknowledgement");
                return Ok(SubmitAck {
                    replayed: true,
                    ..*ack
                });
            }

            let first = channel.next_sequence();
            let actions: Vec<_> = batch
                .actions()
                .iter()
                .zip(first..)
                .map(|(action, sequence)| action.committed_at(sequence))
                .collect();
            ActionBatch::new(
                batch.session_id(),
                batch.actor_id(),
                batch.batch_key(),
                actions,
            )
        };
        let (Some(first), Some(last)) = (
            committed.actions().first().and_then(|a| a.sequence()),
            committed.actions().last().and_then(|a| a.sequence()),
        ) else {
            return Err(TransportError::new("Committed batch lost its sequences"));
        };

        let persisted = committed.clone();
        self.run_blocking(move |repository| {
            repository.append_actions(persisted.session_id(), persisted.batch_key(), persisted.actions())
        })
        .await
        .map_err(|e| TransportError::new(format!("Failed to persist batch: {}", e)))?;

        let ack = SubmitAck {
            batch_key: batch.batch_key(),
            first_sequence: first,
            last_sequence: last,
            replayed: false,
        };
        let mut sessions = self.lock()?;
        let channel = Self::channel(&mut sessions, batch.session_id())?;
        channel.last_sequence = Some(last);
        channel.accepted.insert(batch.batch_key(), ack);
        channel.publish(&committed);
        channel.history.push(committed);

        info!(first, last, subscribers = channel.subscribers.len(), "Batch committed");
        Ok(ack)
    }

    #[instrument(skip(self))]
    async fn subscribe(
        &self,
        session_id: &str,
        after: Option<Sequence>,
    ) -> Result<Subscription, TransportError> {
        self.open(session_id).await?;
        let mut sessions = self.lock()?;
        let channel = Self::channel(&mut sessions, session_id)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let mut replayed = 0usize;
        for batch in &channel.history {
            let missing = batch.after(after);
            if missing.actions().is_empty() {
                continue;
            }
            replayed += missing.actions().len();
            tx.send(missing)
                .map_err(|_| TransportError::new("Subscriber closed during replay"))?;
        }
        channel.subscribers.push(tx);

        info!(replayed, subscribers = channel.subscribers.len(), "Subscriber attached");
        Ok(Subscription::new(session_id, rx))
    }
}
