//! Integration tests for the selection state machine against a recording transport.

use crossword_core::{
    ActionBatch, ActionKind, ActionLog, ActionTransport, BoardState, CrosswordError, Direction,
    Puzzle, Question, SelectionPhase, Selection, Sequence, SubmitAck, SubmitKind, Subscription,
    TransportError,
};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Debug, Default)]
struct RecordingTransport {
    submitted: Mutex<Vec<ActionBatch>>,
    failing: Mutex<bool>,
}

impl RecordingTransport {
    fn submitted(&self) -> Vec<ActionBatch> {
        self.submitted.lock().unwrap().clone()
    }

    fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }
}

#[async_trait::async_trait]
impl ActionTransport for RecordingTransport {
    async fn submit(&self, batch: ActionBatch) -> Result<SubmitAck, TransportError> {
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(batch.clone());
        if *self.failing.lock().unwrap() {
            return Err(TransportError::new("connection refused"));
        }
        let last = submitted.iter().map(|b| b.actions().len() as Sequence).sum();
        Ok(SubmitAck {
            batch_key: batch.batch_key(),
            first_sequence: last - batch.actions().len() as Sequence + 1,
            last_sequence: last,
            replayed: false,
        })
    }

    async fn subscribe(
        &self,
        session_id: &str,
        _after: Option<Sequence>,
    ) -> Result<Subscription, TransportError> {
        let (_tx, rx) = mpsc::unbounded_channel();
        Ok(Subscription::new(session_id, rx))
    }
}

fn puzzle() -> Arc<Puzzle> {
    Arc::new(
        Puzzle::new(vec![
            Question::new("1a", "feline", "CAT", 0, 0, Direction::Across),
            Question::new("1d", "solid", "CUBE", 0, 0, Direction::Down),
        ])
        .unwrap(),
    )
}

fn setup() -> (Arc<Puzzle>, Arc<RecordingTransport>, Selection, BoardState) {
    let puzzle = puzzle();
    let transport = Arc::new(RecordingTransport::default());
    let selection = Selection::new(Arc::clone(&puzzle), transport.clone(), "s1", "alice");
    let board = BoardState::from_log(&puzzle, &ActionLog::new());
    (puzzle, transport, selection, board)
}

#[tokio::test]
async fn test_starts_unselected_with_across_filter() {
    let (_, _, selection, _) = setup();
    assert_eq!(selection.phase(), SelectionPhase::Unselected);
    assert_eq!(selection.direction(), Some(Direction::Across));
    let ids: Vec<_> = selection.filtered_questions().iter().map(|q| q.id()).collect();
    assert_eq!(ids, vec!["1a"]);
}

#[tokio::test]
async fn test_unselect_without_selection_sends_nothing() {
    let (_, transport, mut selection, _) = setup();
    assert!(selection.un_select().await.unwrap().is_none());
    assert!(transport.submitted().is_empty());
}

#[tokio::test]
async fn test_unselect_unmodified_sends_nothing() {
    let (_, transport, mut selection, board) = setup();
    selection.select_question("1a", &board).await.unwrap();
    assert_eq!(selection.phase(), SelectionPhase::Selected);
    assert_eq!(selection.pending_actions().len(), 3);

    assert!(selection.un_select().await.unwrap().is_none());
    assert!(transport.submitted().is_empty());
    assert_eq!(selection.phase(), SelectionPhase::Unselected);
}

#[tokio::test]
async fn test_unselect_modified_autosaves_exactly_once() {
    let (_, transport, mut selection, board) = setup();
    selection.select_question("1a", &board).await.unwrap();
    selection.edit(1, 0, "A").unwrap();
    assert_eq!(selection.phase(), SelectionPhase::Editing);

    let batch = selection.un_select().await.unwrap().expect("autosaved batch");
    let submitted = transport.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0], batch);
    assert!(batch.actions().iter().all(|a| a.kind() == ActionKind::Placeholder));
    assert!(batch.actions().iter().all(|a| a.actor_id() == "alice" && a.session_id() == "s1"));
    assert_eq!(batch.actions()[1].state(), "A");
    assert_eq!(selection.phase(), SelectionPhase::Unselected);
}

#[tokio::test]
async fn test_edit_is_local_until_submitted() {
    let (_, transport, mut selection, board) = setup();
    selection.select_question("1a", &board).await.unwrap();
    selection.edit(0, 0, "C").unwrap();
    selection.edit(2, 0, "T").unwrap();
    assert!(transport.submitted().is_empty());
}

#[tokio::test]
async fn test_edit_outside_answer_is_rejected() {
    let (_, _, mut selection, board) = setup();
    assert_eq!(selection.edit(0, 0, "C"), Err(CrosswordError::NoPendingEdits));

    selection.select_question("1a", &board).await.unwrap();
    assert!(matches!(
        selection.edit(0, 2, "B"),
        Err(CrosswordError::CellNotFound(_))
    ));
}

#[tokio::test]
async fn test_submit_without_selection_fails() {
    let (_, transport, mut selection, _) = setup();
    assert_eq!(
        selection.submit_actions(SubmitKind::Guess).await,
        Err(CrosswordError::NoPendingEdits)
    );
    assert!(transport.submitted().is_empty());
}

#[tokio::test]
async fn test_guess_relabeled_uniformly() {
    let (_, transport, mut selection, board) = setup();
    selection.select_question("1a", &board).await.unwrap();
    for (x, letter) in [(0, "C"), (1, "A"), (2, "T")] {
        selection.edit(x, 0, letter).unwrap();
    }
    let batch = selection.submit_actions(SubmitKind::Guess).await.unwrap();
    assert!(batch.actions().iter().all(|a| a.kind() == ActionKind::CorrectGuess));

    selection.edit(2, 0, "X").unwrap();
    let batch = selection.submit_actions(SubmitKind::Guess).await.unwrap();
    assert!(batch.actions().iter().all(|a| a.kind() == ActionKind::IncorrectGuess));
    assert_eq!(transport.submitted().len(), 2);
}

#[tokio::test]
async fn test_submitted_edits_are_not_autosaved_again() {
    let (_, transport, mut selection, board) = setup();
    selection.select_question("1a", &board).await.unwrap();
    selection.edit(0, 0, "C").unwrap();
    selection.submit_actions(SubmitKind::Placeholder).await.unwrap();
    assert_eq!(selection.phase(), SelectionPhase::Selected);

    assert!(selection.un_select().await.unwrap().is_none());
    assert_eq!(transport.submitted().len(), 1);
}

#[tokio::test]
async fn test_buffer_seeded_from_board() {
    let (puzzle, _, mut selection, _) = setup();
    let mut log = ActionLog::new();
    let seeded = crossword_core::GameAction::new(
        crossword_core::Coordinates::new(0, 0),
        ActionKind::Placeholder,
        "",
        "C",
        "bob",
        "s1",
    );
    log.commit(&[seeded.committed_at(1)]).unwrap();
    let board = BoardState::from_log(&puzzle, &log);

    selection.select_question("1d", &board).await.unwrap();
    let states: Vec<_> = selection.pending_actions().iter().map(|a| a.state()).collect();
    assert_eq!(states, vec!["C", "", "", ""]);
    assert_eq!(selection.phase(), SelectionPhase::Selected);
}

#[tokio::test]
async fn test_switching_question_autosaves_and_carries_value() {
    let (_, transport, mut selection, board) = setup();
    selection.select_question("1a", &board).await.unwrap();
    selection.edit(0, 0, "C").unwrap();

    let flushed = selection.select_question("1d", &board).await.unwrap();
    assert!(flushed.is_some());
    assert_eq!(transport.submitted().len(), 1);
    assert_eq!(selection.selected_question().unwrap().id(), "1d");
    assert_eq!(selection.pending_actions()[0].state(), "C");
    assert_eq!(selection.phase(), SelectionPhase::Selected);
}

#[tokio::test]
async fn test_select_coordinates_respects_filter() {
    let (_, _, mut selection, board) = setup();
    assert!(matches!(
        selection.select_coordinates(0, 1, &board).await,
        Err(CrosswordError::NoMatchingQuestion { filter: Some(Direction::Across), .. })
    ));

    selection.select_coordinates(0, 0, &board).await.unwrap();
    assert_eq!(selection.selected_question().unwrap().id(), "1a");

    selection.filter_down().await.unwrap();
    assert_eq!(selection.phase(), SelectionPhase::Unselected);
    selection.select_coordinates(0, 0, &board).await.unwrap();
    assert_eq!(selection.selected_question().unwrap().id(), "1d");
}

#[tokio::test]
async fn test_unfiltered_selection_needs_unique_owner() {
    let (_, transport, mut selection, board) = setup();
    selection.filter_across().await.unwrap();
    assert_eq!(selection.direction(), None);
    assert_eq!(selection.filtered_questions().len(), 2);

    assert!(matches!(
        selection.select_coordinates(0, 0, &board).await,
        Err(CrosswordError::NoMatchingQuestion { filter: None, .. })
    ));
    assert_eq!(selection.phase(), SelectionPhase::Unselected);
    assert!(transport.submitted().is_empty());

    selection.select_coordinates(0, 3, &board).await.unwrap();
    assert_eq!(selection.selected_question().unwrap().id(), "1d");
    selection.select_coordinates(2, 0, &board).await.unwrap();
    assert_eq!(selection.selected_question().unwrap().id(), "1a");
}

#[tokio::test]
async fn test_filter_switch_autosaves_edits() {
    let (_, transport, mut selection, board) = setup();
    selection.select_question("1a", &board).await.unwrap();
    selection.edit(1, 0, "A").unwrap();

    let flushed = selection.filter_down().await.unwrap();
    assert!(flushed.is_some());
    assert_eq!(transport.submitted().len(), 1);
    assert_eq!(selection.direction(), Some(Direction::Down));
    assert_eq!(selection.phase(), SelectionPhase::Unselected);
}

#[tokio::test]
async fn test_failed_autosave_keeps_edits_and_retries_same_key() {
    let (_, transport, mut selection, board) = setup();
    selection.select_question("1a", &board).await.unwrap();
    selection.edit(1, 0, "A").unwrap();

    transport.set_failing(true);
    assert!(matches!(
        selection.un_select().await,
        Err(CrosswordError::Transport(_))
    ));
    assert_eq!(selection.phase(), SelectionPhase::Editing);
    assert_eq!(selection.pending_actions()[1].state(), "A");

    transport.set_failing(false);
    selection.un_select().await.unwrap();
    let submitted = transport.submitted();
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0].batch_key(), submitted[1].batch_key());
    assert_eq!(selection.phase(), SelectionPhase::Unselected);
}
