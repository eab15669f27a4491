//! Interface to the submission and subscription channel.
//!
//! The engine never talks to the network itself. Sessions receive an explicit
//! [`ActionTransport`] handle; implementations decide how batches travel and
//! must assign a single total order per session.

use crate::action::{BatchKey, GameAction, Sequence};
use crate::types::{ActorId, SessionId};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::instrument;

/// A group of actions submitted or delivered together.
///
/// Submitted batches carry unsequenced actions; delivered batches carry the
/// server-assigned sequences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionBatch {
    session_id: SessionId,
    actor_id: ActorId,
    batch_key: BatchKey,
    actions: Vec<GameAction>,
}

impl ActionBatch {
    /// Creates a batch.
    pub fn new(
        session_id: impl Into<SessionId>,
        actor_id: impl Into<ActorId>,
        batch_key: BatchKey,
        actions: Vec<GameAction>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            actor_id: actor_id.into(),
            batch_key,
            actions,
        }
    }

    /// Returns the session the batch belongs to.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Returns the submitting player.
    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    /// Returns the idempotency key.
    pub fn batch_key(&self) -> BatchKey {
        self.batch_key
    }

    /// Returns the actions in submission order.
    pub fn actions(&self) -> &[GameAction] {
        &self.actions
    }

    /// Consumes the batch, returning its actions.
    pub fn into_actions(self) -> Vec<GameAction> {
        self.actions
    }

    /// Returns a copy holding only actions committed after `after`.
    pub fn after(&self, after: Option<Sequence>) -> Self {
        Self {
            actions: self
                .actions
                .iter()
                .filter(|a| match (a.sequence(), after) {
                    (Some(seq), Some(after)) => seq > after,
                    (Some(_), None) => true,
                    (None, _) => false,
                })
                .cloned()
                .collect(),
            ..self.clone()
        }
    }
}

/// Acknowledgement of an accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAck {
    /// Key of the acknowledged batch.
    pub batch_key: BatchKey,
    /// Sequence of the batch's first action.
    pub first_sequence: Sequence,
    /// Sequence of the batch's last action.
    pub last_sequence: Sequence,
    /// True if the key had already been accepted and nothing was appended.
    pub replayed: bool,
}

/// Ordered, restartable feed of committed batches for one session.
#[derive(Debug)]
pub struct Subscription {
    session_id: SessionId,
    receiver: mpsc::UnboundedReceiver<ActionBatch>,
}

impl Subscription {
    /// Wraps the receiving end of a batch channel.
    pub fn new(session_id: impl Into<SessionId>, receiver: mpsc::UnboundedReceiver<ActionBatch>) -> Self {
        Self {
            session_id: session_id.into(),
            receiver,
        }
    }

    /// Returns the subscribed session.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Waits for the next batch. `None` once the transport closes the feed.
    pub async fn next(&mut self) -> Option<ActionBatch> {
        self.receiver.recv().await
    }

    /// Returns the next batch if one is already queued.
    pub fn try_next(&mut self) -> Option<ActionBatch> {
        self.receiver.try_recv().ok()
    }
}

/// Submission and subscription channel for action batches.
#[async_trait::async_trait]
pub trait ActionTransport: Send + Sync + std::fmt::Debug {
    /// Appends a batch to its session's log.
    ///
    /// Re-submitting an accepted [`BatchKey`] must return the original
    /// acknowledgement without appending again.
    async fn submit(&self, batch: ActionBatch) -> Result<SubmitAck, TransportError>;

    /// Subscribes to committed batches of a session, replaying those after
    /// `after` before delivering live ones.
    async fn subscribe(
        &self,
        session_id: &str,
        after: Option<Sequence>,
    ) -> Result<Subscription, TransportError>;
}

/// Transport error with location tracking.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Transport error: {} at {}:{}", message, file, line)]
pub struct TransportError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl TransportError {
    /// Creates a new transport error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
