//! Two players editing one session through the hub converge on one board.

use crossword_core::{
    ActionKind, ActionTransport, Coordinates, Direction, Puzzle, Question, QuestionProgress,
    Selection, SubmitKind,
};
use crossword_server::{ClientReplica, SessionHub};
use std::sync::Arc;

fn puzzle() -> Arc<Puzzle> {
    Arc::new(
        Puzzle::new(vec![
            Question::new("1a", "feline", "CAT", 0, 0, Direction::Across),
            Question::new("1d", "solid", "CUBE", 0, 0, Direction::Down),
        ])
        .unwrap(),
    )
}

struct Player {
    replica: ClientReplica,
    selection: Selection,
    subscription: crossword_core::Subscription,
}

async fn join(hub: &Arc<SessionHub>, puzzle: &Arc<Puzzle>, actor: &str) -> Player {
    let replica = ClientReplica::new(Arc::clone(puzzle), "s1");
    let subscription = replica.connect(hub.as_ref()).await.unwrap();
    let transport: Arc<dyn ActionTransport> = hub.clone();
    let selection = Selection::new(Arc::clone(puzzle), transport, "s1", actor);
    Player {
        replica,
        selection,
        subscription,
    }
}

impl Player {
    fn sync(&mut self) {
        self.replica.drain_ready(&mut self.subscription).unwrap();
    }
}

#[tokio::test]
async fn test_players_converge_on_shared_board() {
    let hub = Arc::new(SessionHub::new());
    let puzzle = puzzle();
    let mut alice = join(&hub, &puzzle, "alice").await;
    let mut bob = join(&hub, &puzzle, "bob").await;

    let board = alice.replica.board();
    alice.selection.select_question("1a", &board).await.unwrap();
    for (x, letter) in [(0, "C"), (1, "A"), (2, "T")] {
        alice.selection.edit(x, 0, letter).unwrap();
    }
    let batch = alice.selection.submit_actions(SubmitKind::Guess).await.unwrap();
    alice.replica.record_local(&batch);
    assert_eq!(alice.replica.log().pending().len(), 3);

    bob.sync();
    let board = bob.replica.board();
    assert_eq!(board.value_at(Coordinates::new(0, 0)), "C");
    bob.selection.select_question("1d", &board).await.unwrap();
    for (y, letter) in [(1, "U"), (2, "B"), (3, "E")] {
        bob.selection.edit(0, y, letter).unwrap();
    }
    let batch = bob.selection.un_select().await.unwrap().expect("autosave");
    bob.replica.record_local(&batch);

    alice.sync();
    bob.sync();

    let alice_board = alice.replica.board();
    let bob_board = bob.replica.board();
    assert_eq!(alice_board, bob_board);
    assert_eq!(
        serde_json::to_string(&alice_board).unwrap(),
        serde_json::to_string(&bob_board).unwrap()
    );
    assert!(alice.replica.log().pending().is_empty());
    assert!(bob.replica.log().pending().is_empty());
    assert!(alice_board.is_complete());
    assert_eq!(alice_board.display(), "CAT\nU##\nB##\nE##");

    let across = puzzle.answer_map("1a").unwrap();
    assert_eq!(alice_board.question_progress(across), QuestionProgress::Solved);
    let judged = alice_board.cell(Coordinates::new(2, 0)).unwrap();
    assert_eq!(judged.last_modification().unwrap().kind(), ActionKind::CorrectGuess);
    let shared = alice_board.cell(Coordinates::new(0, 0)).unwrap();
    assert_eq!(shared.modifications().len(), 2);
    assert_eq!(shared.last_modification().unwrap().actor_id(), "bob");
}

#[tokio::test]
async fn test_late_joiner_receives_full_history() {
    let hub = Arc::new(SessionHub::new());
    let puzzle = puzzle();
    let mut alice = join(&hub, &puzzle, "alice").await;

    let board = alice.replica.board();
    alice.selection.select_question("1a", &board).await.unwrap();
    alice.selection.edit(0, 0, "C").unwrap();
    alice.selection.submit_actions(SubmitKind::Placeholder).await.unwrap();
    alice.selection.edit(1, 0, "A").unwrap();
    alice.selection.submit_actions(SubmitKind::Placeholder).await.unwrap();
    alice.sync();

    let mut carol = join(&hub, &puzzle, "carol").await;
    carol.sync();
    assert_eq!(carol.replica.board(), alice.replica.board());
    assert_eq!(carol.replica.log().last_sequence(), Some(6));
}

#[tokio::test]
async fn test_reconnect_replays_only_missing_batches() {
    let hub = Arc::new(SessionHub::new());
    let puzzle = puzzle();
    let mut alice = join(&hub, &puzzle, "alice").await;
    let mut bob = join(&hub, &puzzle, "bob").await;

    let board = alice.replica.board();
    alice.selection.select_question("1a", &board).await.unwrap();
    alice.selection.edit(0, 0, "C").unwrap();
    alice.selection.submit_actions(SubmitKind::Placeholder).await.unwrap();
    bob.sync();
    assert_eq!(bob.replica.log().last_sequence(), Some(3));

    // Bob drops off while alice keeps editing.
    drop(std::mem::replace(
        &mut bob.subscription,
        hub.subscribe("s1", Some(u64::MAX)).await.unwrap(),
    ));
    alice.selection.edit(1, 0, "A").unwrap();
    alice.selection.submit_actions(SubmitKind::Placeholder).await.unwrap();

    bob.subscription = bob.replica.connect(hub.as_ref()).await.unwrap();
    let applied = bob.replica.drain_ready(&mut bob.subscription).unwrap();
    assert_eq!(applied, 3);
    assert_eq!(bob.replica.log().committed().len(), 6);
    assert_eq!(bob.replica.board().value_at(Coordinates::new(1, 0)), "A");
}

#[tokio::test]
async fn test_replica_watch_sees_remote_commit() {
    let hub = Arc::new(SessionHub::new());
    let puzzle = puzzle();
    let mut alice = join(&hub, &puzzle, "alice").await;
    let mut bob = join(&hub, &puzzle, "bob").await;
    let mut bob_view = bob.replica.watch();

    let board = alice.replica.board();
    alice.selection.select_coordinates(2, 0, &board).await.unwrap();
    alice.selection.edit(2, 0, "T").unwrap();
    alice.selection.un_select().await.unwrap();

    bob.sync();
    assert!(bob_view.has_changed().unwrap());
    assert_eq!(bob_view.borrow_and_update().value_at(Coordinates::new(2, 0)), "T");
}

#[tokio::test]
async fn test_feed_gap_recovers_by_reconnecting() {
    let hub = Arc::new(SessionHub::new());
    let puzzle = puzzle();
    let mut alice = join(&hub, &puzzle, "alice").await;
    let mut bob = join(&hub, &puzzle, "bob").await;

    let board = alice.replica.board();
    alice.selection.select_question("1a", &board).await.unwrap();
    alice.selection.edit(0, 0, "C").unwrap();
    alice.selection.submit_actions(SubmitKind::Placeholder).await.unwrap();
    alice.selection.edit(1, 0, "A").unwrap();
    alice.selection.submit_actions(SubmitKind::Placeholder).await.unwrap();

    // Bob sees the second batch before the first.
    let first = bob.subscription.try_next().unwrap();
    let second = bob.subscription.try_next().unwrap();
    let err = bob.replica.apply(&second).unwrap_err();
    assert!(err.needs_resubscribe());
    assert!(bob.replica.log().is_empty());
    drop(first);

    bob.subscription = bob.replica.connect(hub.as_ref()).await.unwrap();
    assert_eq!(bob.replica.drain_ready(&mut bob.subscription).unwrap(), 6);
    alice.sync();
    assert_eq!(bob.replica.board(), alice.replica.board());
}
