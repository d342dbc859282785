//! End-to-end flows through the public study-board API: content steps
//! driving guided sessions, free exploration with branch management, and
//! persistence round trips.

use study_board::{
    from_json, to_json, AnnotationKind, BoardMode, Evaluation, MoveOutcome, MoveTree, Session,
    SessionEvent, StepDescriptor,
};
use study_core::Square;
use study_engine::GameStatus;

fn sq(s: &str) -> Square {
    Square::from_algebraic(s).unwrap()
}

fn played(outcome: MoveOutcome) -> (study_board::MoveReport, Vec<SessionEvent>) {
    match outcome {
        MoveOutcome::Played { report, events } => (report, events),
        other => panic!("expected Played, got {other:?}"),
    }
}

#[test]
fn lesson_step_runs_with_a_scripted_reply() {
    let step: StepDescriptor = serde_json::from_str(
        r#"{
            "startingPosition": "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "boardMode": "lesson",
            "expectedMoves": ["e2e4", "d2d4"],
            "autoRespond": {"move": "e7e5", "delay": 250}
        }"#,
    )
    .unwrap();
    let mut session = Session::from_step(&step).unwrap();

    // Chess-legal but off script.
    assert_eq!(session.try_move_uci("g1f3"), MoveOutcome::ModeRestricted);

    let (report, events) = played(session.try_move_uci("e2e4"));
    assert_eq!(report.san, "e4");
    assert_eq!(report.status, GameStatus::Active);
    match events.as_slice() {
        [SessionEvent::AutoResponded(reply)] => {
            assert_eq!(reply.uci, "e7e5");
            assert_eq!(reply.san, "e5");
        }
        other => panic!("expected one auto response, got {other:?}"),
    }

    // The reply advanced the board; White is on move again and the
    // lesson board stays open.
    assert!(session.fen().contains(" w "));
    assert!(!session.is_locked());
}

#[test]
fn puzzle_plays_replies_and_locks_when_solved() {
    let step: StepDescriptor = serde_json::from_str(
        r#"{
            "startingPosition": "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "boardMode": "puzzle",
            "expectedMoves": ["e2e4", "e7e5", "g1f3"]
        }"#,
    )
    .unwrap();
    let mut session = Session::from_step(&step).unwrap();
    assert!(!session.can_branch());

    // Legal, but not the solution move.
    assert_eq!(session.try_move_uci("d2d4"), MoveOutcome::ModeRestricted);

    let (_, events) = played(session.try_move_uci("e2e4"));
    assert!(matches!(
        events.as_slice(),
        [SessionEvent::AutoResponded(reply)] if reply.uci == "e7e5"
    ));
    assert_eq!(session.script_progress(), 2);

    // Replaying the already-consumed first move is off script now.
    assert_eq!(session.try_move_uci("e2e4"), MoveOutcome::ModeRestricted);

    let (report, events) = played(session.try_move_uci("g1f3"));
    assert_eq!(report.status, GameStatus::Active);
    assert_eq!(
        events,
        vec![SessionEvent::ExerciseComplete, SessionEvent::BoardLocked]
    );
    assert!(session.is_locked());
    assert_eq!(session.try_move_uci("b8c6"), MoveOutcome::ModeRestricted);
}

#[test]
fn script_gating_is_distinct_from_legality() {
    let step: StepDescriptor = serde_json::from_str(
        r#"{
            "startingPosition": "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "boardMode": "puzzle",
            "expectedMoves": ["e2e5"]
        }"#,
    )
    .unwrap();
    let mut session = Session::from_step(&step).unwrap();

    // Off script, even though it is a fine chess move.
    assert_eq!(session.try_move_uci("e2e4"), MoveOutcome::ModeRestricted);
    // On script, but no pawn jumps three ranks.
    assert_eq!(session.try_move_uci("e2e5"), MoveOutcome::Illegal);
}

#[test]
fn a_bad_scripted_reply_is_skipped_not_fatal() {
    let step: StepDescriptor = serde_json::from_str(
        r#"{
            "startingPosition": "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "boardMode": "puzzle",
            "expectedMoves": ["e2e4", "e7e9"]
        }"#,
    )
    .unwrap();
    let mut session = Session::from_step(&step).unwrap();

    let (_, events) = played(session.try_move_uci("e2e4"));
    assert!(events.is_empty());
    assert!(!session.is_locked());
    assert_eq!(session.script_progress(), 1);
}

#[test]
fn free_exploration_manages_variations() {
    let mut session = Session::new(BoardMode::FreeExplore);
    let (report, _) = played(session.try_move_uci("e2e4"));
    let e4 = report.node;
    assert!(session.back());
    let (report, _) = played(session.try_move_uci("d2d4"));
    let d4 = report.node;

    // Arrival order makes e4 the main line until d4 is promoted.
    assert_eq!(session.tree().main_line()[1], e4);
    assert!(session.promote_variation(d4));
    assert_eq!(session.tree().main_line()[1], d4);

    // Deleting the branch the cursor stands on relocates it upward.
    assert!(session.go_to(e4));
    assert!(session.delete_variation(e4));
    assert_eq!(session.tree().cursor(), session.tree().root());
    assert!(session.tree().node(e4).is_none());
}

#[test]
fn a_saved_tree_replays_read_only() {
    let mut author = Session::new(BoardMode::FreeExplore);
    for uci in ["e2e4", "e7e5", "g1f3", "b8c6"] {
        played(author.try_move_uci(uci));
    }
    author.set_comment(Some("the open game".into()));
    let json = to_json(author.tree()).unwrap();

    let mut replay = Session::with_tree(from_json(&json).unwrap(), BoardMode::Replay);
    assert_eq!(replay.try_move_uci("f1b5"), MoveOutcome::ModeRestricted);
    assert!(replay.to_start());
    assert!(replay.forward());
    assert_eq!(
        replay.fen(),
        "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
    );
    assert!(!replay.set_comment(Some("scribble".into())));
}

#[test]
fn serialization_round_trips_branches_annotations_and_cursor() {
    let mut tree = MoveTree::new();
    let e4 = tree.try_move_uci("e2e4").unwrap();
    tree.try_move_uci("e7e5").unwrap();
    tree.to_start();
    let d4 = tree.try_move_uci("d2d4").unwrap();
    tree.to_start();
    let c4 = tree.try_move_uci("c2c4").unwrap();

    tree.set_comment(e4, Some("the king's pawn".into()));
    tree.set_glyphs(e4, vec![1]);
    tree.set_evaluation(d4, Some(Evaluation::Centipawns(25)));
    tree.set_author(c4, Some("coach".into()));
    tree.annotate(
        e4,
        AnnotationKind::Arrow {
            from: sq("g1"),
            to: sq("f3"),
            color: "green".into(),
        },
    );
    tree.annotate(
        d4,
        AnnotationKind::Highlight {
            square: sq("d4"),
            color: "blue".into(),
        },
    );
    tree.annotate(
        c4,
        AnnotationKind::Text {
            square: sq("c4"),
            text: "English".into(),
            style: "label".into(),
        },
    );
    tree.go_to(d4);

    let restored = from_json(&to_json(&tree).unwrap()).unwrap();
    assert_eq!(restored, tree);
    assert_eq!(restored.cursor(), d4);
    assert_eq!(restored.node(e4).unwrap().annotations().len(), 1);
    assert_eq!(
        restored.node(d4).unwrap().metadata().evaluation,
        Some(Evaluation::Centipawns(25))
    );
}
