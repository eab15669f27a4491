//! Append-only action log for one game session.
//!
//! The log has two parts: the committed prefix, in the order the server
//! accepted it, and a pending tail of optimistic local submissions the server
//! has not echoed back yet. Nothing is ever rewritten in place.

use crate::action::{GameAction, Sequence};
use crate::error::CrosswordError;
use crate::transport::ActionBatch;
use crate::types::Coordinates;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Ordered record of every committed action in a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLog {
    committed: Vec<GameAction>,
    pending: Vec<GameAction>,
}

impl ActionLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a log from already committed actions in server order.
    ///
    /// # Errors
    ///
    /// Returns [`CrosswordError::UnsequencedAction`] if any action lacks a sequence.
    #[instrument(skip(actions))]
    pub fn from_committed(actions: Vec<GameAction>) -> Result<Self, CrosswordError> {
        let mut log = Self::new();
        log.commit(&actions)?;
        Ok(log)
    }

    /// Appends committed actions in delivery order.
    ///
    /// Sequences are contiguous from 1. Actions at or below the last committed
    /// sequence are redeliveries and are skipped. Matching entries are dropped
    /// from the pending tail. Returns how many actions were appended.
    ///
    /// # Errors
    ///
    /// Returns [`CrosswordError::UnsequencedAction`] if any action lacks a
    /// sequence, and [`CrosswordError::SequenceGap`] if an action skips past
    /// the next expected sequence. Nothing from the batch is appended in
    /// either case.
    #[instrument(skip(self, actions), fields(incoming = actions.len()))]
    pub fn commit(&mut self, actions: &[GameAction]) -> Result<usize, CrosswordError> {
        let mut last = self.last_sequence().unwrap_or_default();
        for action in actions {
            let Some(sequence) = action.sequence() else {
                warn!(action_id = %action.id(), "Committed batch contains unsequenced action");
                return Err(CrosswordError::UnsequencedAction(action.id()));
            };
            let expected = last.saturating_add(1);
            if sequence > expected {
                warn!(expected, received = sequence, "Committed batch skips a sequence");
                return Err(CrosswordError::SequenceGap {
                    expected,
                    received: sequence,
                });
            }
            last = last.max(sequence);
        }

        let mut appended = 0;
        for action in actions {
            let sequence = action.sequence().unwrap_or_default();
            if sequence <= self.last_sequence().unwrap_or_default() {
                debug!(sequence, action_id = %action.id(), "Skipping redelivered action");
                continue;
            }
            self.pending.retain(|p| p.id() != action.id());
            self.committed.push(action.clone());
            appended += 1;
        }

        if appended > 0 {
            info!(appended, last_sequence = ?self.last_sequence(), "Actions committed");
        }
        Ok(appended)
    }

    /// Appends a committed batch delivered by the subscription feed.
    ///
    /// # Errors
    ///
    /// See [`ActionLog::commit`].
    pub fn commit_batch(&mut self, batch: &ActionBatch) -> Result<usize, CrosswordError> {
        self.commit(batch.actions())
    }

    /// Records optimistic local actions not yet acknowledged by the server.
    #[instrument(skip(self, actions))]
    pub fn record_pending(&mut self, actions: impl IntoIterator<Item = GameAction>) {
        let before = self.pending.len();
        for action in actions {
            let already_committed = self.committed.iter().any(|c| c.id() == action.id());
            if !already_committed {
                self.pending.push(action);
            }
        }
        debug!(added = self.pending.len() - before, "Pending actions recorded");
    }

    /// Returns the committed prefix in server order.
    pub fn committed(&self) -> &[GameAction] {
        &self.committed
    }

    /// Returns the optimistic tail in submission order.
    pub fn pending(&self) -> &[GameAction] {
        &self.pending
    }

    /// Iterates the full log: committed prefix, then pending tail.
    pub fn ordered(&self) -> impl Iterator<Item = &GameAction> {
        self.committed.iter().chain(self.pending.iter())
    }

    /// Returns the modification history of one coordinate, in log order.
    pub fn history_at(&self, at: Coordinates) -> impl Iterator<Item = &GameAction> {
        self.ordered().filter(move |a| a.coordinates() == at)
    }

    /// Returns the last committed sequence, the resume point for subscriptions.
    pub fn last_sequence(&self) -> Option<Sequence> {
        self.committed.last().and_then(GameAction::sequence)
    }

    /// Total number of entries, committed and pending.
    pub fn len(&self) -> usize {
        self.committed.len() + self.pending.len()
    }

    /// Returns true if the log holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;

    fn action(x: u32, state: &str) -> GameAction {
        GameAction::new(Coordinates::new(x, 0), ActionKind::Placeholder, "", state, "alice", "s1")
    }

    #[test]
    fn test_commit_appends_in_delivery_order() {
        let mut log = ActionLog::new();
        let batch = vec![action(0, "C").committed_at(1), action(1, "A").committed_at(2)];
        assert_eq!(log.commit(&batch).unwrap(), 2);
        assert_eq!(log.last_sequence(), Some(2));
        assert_eq!(log.committed()[0].state(), "C");
    }

    #[test]
    fn test_redelivery_is_skipped() {
        let mut log = ActionLog::new();
        let batch = vec![action(0, "C").committed_at(1), action(1, "A").committed_at(2)];
        log.commit(&batch).unwrap();
        assert_eq!(log.commit(&batch).unwrap(), 0);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_unsequenced_batch_rejected_atomically() {
        let mut log = ActionLog::new();
        let batch = vec![action(0, "C").committed_at(1), action(1, "A")];
        assert!(matches!(
            log.commit(&batch),
            Err(CrosswordError::UnsequencedAction(_))
        ));
        assert!(log.is_empty());
    }

    #[test]
    fn test_gap_rejected_until_missing_sequence_arrives() {
        let mut log = ActionLog::new();
        log.commit(&[action(0, "C").committed_at(1)]).unwrap();

        let early = [action(2, "T").committed_at(3)];
        assert_eq!(
            log.commit(&early),
            Err(CrosswordError::SequenceGap {
                expected: 2,
                received: 3
            })
        );
        assert_eq!(log.last_sequence(), Some(1));

        log.commit(&[action(1, "A").committed_at(2)]).unwrap();
        assert_eq!(log.commit(&early).unwrap(), 1);
        let sequences: Vec<_> = log.committed().iter().map(GameAction::sequence).collect();
        assert_eq!(sequences, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_first_commit_must_start_at_one() {
        let mut log = ActionLog::new();
        let batch = vec![action(0, "C").committed_at(2), action(1, "A").committed_at(3)];
        assert!(matches!(
            log.commit(&batch),
            Err(CrosswordError::SequenceGap { expected: 1, .. })
        ));
        assert!(log.is_empty());
    }

    #[test]
    fn test_commit_promotes_pending() {
        let mut log = ActionLog::new();
        let local = action(0, "C");
        log.record_pending(vec![local.clone()]);
        assert_eq!(log.pending().len(), 1);

        log.commit(&[local.committed_at(1)]).unwrap();
        assert!(log.pending().is_empty());
        assert_eq!(log.committed().len(), 1);
    }

    #[test]
    fn test_ordered_puts_pending_after_committed() {
        let mut log = ActionLog::new();
        let local = action(0, "X");
        log.record_pending(vec![local]);
        log.commit(&[action(0, "C").committed_at(1)]).unwrap();

        let states: Vec<_> = log.history_at(Coordinates::new(0, 0)).map(|a| a.state()).collect();
        assert_eq!(states, vec!["C", "X"]);
    }
}
