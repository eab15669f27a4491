//! First-class action types for the crossword action log.
//!
//! Every edit a player commits is an immutable [`GameAction`]. The board is
//! never stored; it is folded from the ordered log of these actions.

use crate::types::{ActorId, Coordinates, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server-assigned position of an action in its session's log.
pub type Sequence = u64;

/// Unique identifier of an action.
pub type ActionId = Uuid;

/// What a player meant by an action.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ActionKind {
    /// Work-in-progress letters saved without judging.
    Placeholder,
    /// A guess awaiting judgement.
    Guess,
    /// Withdrawn letters.
    Cancel,
    /// Part of a guess judged correct as a whole.
    CorrectGuess,
    /// Part of a guess judged incorrect as a whole.
    IncorrectGuess,
}

/// Kinds a player may submit directly.
///
/// Judged kinds are only ever produced by the correctness checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SubmitKind {
    /// Autosave or explicit save.
    Placeholder,
    /// Submit the answer for judgement.
    Guess,
    /// Withdraw the answer.
    Cancel,
}

impl From<SubmitKind> for ActionKind {
    fn from(kind: SubmitKind) -> Self {
        match kind {
            SubmitKind::Placeholder => ActionKind::Placeholder,
            SubmitKind::Guess => ActionKind::Guess,
            SubmitKind::Cancel => ActionKind::Cancel,
        }
    }
}

/// Idempotency key attached to every submitted batch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
#[serde(transparent)]
pub struct BatchKey(Uuid);

impl BatchKey {
    /// Generates a fresh random key.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for BatchKey {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A single edit of one grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameAction {
    id: ActionId,
    coordinates: Coordinates,
    kind: ActionKind,
    previous_state: String,
    state: String,
    submitted_at: DateTime<Utc>,
    actor_id: ActorId,
    session_id: SessionId,
    sequence: Option<Sequence>,
}

impl GameAction {
    /// Creates a new, not yet committed action stamped with a fresh id and the current time.
    pub fn new(
        coordinates: Coordinates,
        kind: ActionKind,
        previous_state: impl Into<String>,
        state: impl Into<String>,
        actor_id: impl Into<ActorId>,
        session_id: impl Into<SessionId>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            coordinates,
            kind,
            previous_state: previous_state.into(),
            state: state.into(),
            submitted_at: Utc::now(),
            actor_id: actor_id.into(),
            session_id: session_id.into(),
            sequence: None,
        }
    }

    /// Rebuilds a stored action from its persisted parts.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: ActionId,
        coordinates: Coordinates,
        kind: ActionKind,
        previous_state: String,
        state: String,
        submitted_at: DateTime<Utc>,
        actor_id: ActorId,
        session_id: SessionId,
        sequence: Option<Sequence>,
    ) -> Self {
        Self {
            id,
            coordinates,
            kind,
            previous_state,
            state,
            submitted_at,
            actor_id,
            session_id,
            sequence,
        }
    }

    /// Returns the action id.
    pub fn id(&self) -> ActionId {
        self.id
    }

    /// Returns the edited coordinate.
    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    /// Returns the action kind.
    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    /// Returns the cell value before this action.
    pub fn previous_state(&self) -> &str {
        &self.previous_state
    }

    /// Returns the cell value after this action.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Returns the client submission time. Informational only, never used for ordering.
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Returns the acting player.
    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    /// Returns the owning session.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Returns the server-assigned sequence, if committed.
    pub fn sequence(&self) -> Option<Sequence> {
        self.sequence
    }

    /// Returns true if the action changes the cell value.
    pub fn is_change(&self) -> bool {
        self.previous_state != self.state
    }

    /// Returns a copy of this action committed at `sequence`.
    pub fn committed_at(&self, sequence: Sequence) -> Self {
        Self {
            sequence: Some(sequence),
            ..self.clone()
        }
    }

    pub(crate) fn set_kind(&mut self, kind: ActionKind) {
        self.kind = kind;
    }

    pub(crate) fn set_state(&mut self, state: String) {
        self.state = state;
    }

    pub(crate) fn rebase(&mut self) {
        self.previous_state = self.state.clone();
    }

    /// Re-stamps an edit buffer entry for submission: fresh id, current time.
    pub(crate) fn stamped(&self, kind: ActionKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            submitted_at: Utc::now(),
            sequence: None,
            ..self.clone()
        }
    }
}

impl std::fmt::Display for GameAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {:?} -> {:?} by {}",
            self.kind, self.coordinates, self.previous_state, self.state, self.actor_id
        )
    }
}
