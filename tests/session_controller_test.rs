//! Tests for the session state machine against the reference rules service.

mod common;

use common::{RulesService, board_from_rows, flips, legal_moves, root_only_analysis, sq};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use strictly_othello::{
    Cell, Difficulty, GameMode, GameSettings, Move, NodeId, OpponentReplies, Phase, Player,
    SessionController, SessionError, Snapshot, TreeError,
};

type Session = SessionController<RulesService>;

async fn human_game() -> (Arc<RulesService>, Session, OpponentReplies) {
    let service = Arc::new(RulesService::new());
    let (mut session, replies) = SessionController::new(Arc::clone(&service));
    session
        .start_game(GameSettings::default())
        .await
        .expect("Failed to start game");
    (service, session, replies)
}

async fn ai_game(service: RulesService, human_side: Player) -> (Arc<RulesService>, Session, OpponentReplies) {
    let service = Arc::new(service);
    let (mut session, replies) = SessionController::new(Arc::clone(&service));
    session
        .start_game(GameSettings::against_ai(human_side, Difficulty::Medium))
        .await
        .expect("Failed to start game");
    (service, session, replies)
}

/// Receives the next opponent reply and applies it.
async fn apply_next_reply(session: &mut Session, replies: &mut OpponentReplies) {
    let reply = tokio::time::timeout(Duration::from_secs(5), replies.recv())
        .await
        .expect("Opponent reply timed out")
        .expect("Reply channel closed");
    assert!(session.on_opponent_reply(reply).await.expect("Reply failed"));
}

/// Applies opponent replies until no request is outstanding, skipping stale ones.
async fn drain_opponent(session: &mut Session, replies: &mut OpponentReplies) {
    while session.is_opponent_thinking() {
        let reply = tokio::time::timeout(Duration::from_secs(5), replies.recv())
            .await
            .expect("Opponent reply timed out")
            .expect("Reply channel closed");
        session.on_opponent_reply(reply).await.expect("Reply failed");
    }
}

#[tokio::test]
async fn test_opening_d3_flips_d4() {
    let (_service, mut session, _replies) = human_game().await;
    assert_eq!(session.legal_moves(), &[sq("d3"), sq("c4"), sq("f5"), sq("e6")]);

    assert!(session.click(sq("d3")).await.expect("Click failed"));

    let view = session.view().expect("Game in progress");
    for square in ["d3", "d4", "d5"] {
        assert_eq!(view.board.get(sq(square)), Cell::Black, "{square} should be black");
    }
    assert_eq!(view.flipped, vec![sq("d4")]);
    assert_eq!(view.to_move, Some(Player::White));
    assert_eq!(view.phase, Phase::Playing);
    assert_eq!(view.moves_played, 1);
    assert_eq!(view.last_move, Some(Move::place(Player::Black, sq("d3"))));
    assert_eq!(view.score.black, 4);
    assert_eq!(view.score.white, 1);
}

#[tokio::test]
async fn test_clicks_outside_play_are_ignored() {
    let service = Arc::new(RulesService::new());
    let (mut session, _replies) = SessionController::new(Arc::clone(&service));
    assert!(!session.click(sq("d3")).await.expect("Click failed"));
    assert_eq!(session.phase(), Phase::Setup);
    assert!(session.view().is_none());

    session
        .start_game(GameSettings::default())
        .await
        .expect("Failed to start game");
    assert!(!session.click(sq("a1")).await.expect("Click failed"));
    assert_eq!(service.human_calls(), 0);
    assert_eq!(session.current(), NodeId::ROOT);
}

#[tokio::test]
async fn test_clicks_on_opponent_turn_are_ignored() {
    let (service, mut session, _replies) = ai_game(RulesService::gated(), Player::Black).await;
    assert!(session.click(sq("d3")).await.expect("Click failed"));
    assert!(session.is_opponent_thinking());

    let white_move = legal_moves(session.tree().get(session.current()).expect("node").board(), Player::White)[0];
    assert!(!session.click(white_move).await.expect("Click failed"));
    assert_eq!(service.human_calls(), 1);
    assert_eq!(session.tree().len(), 2);
}

#[tokio::test]
async fn test_replaying_explored_move_reuses_child() {
    let (service, mut session, _replies) = human_game().await;
    session.click(sq("d3")).await.expect("Click failed");
    let first_visit = session.current();

    assert!(session.undo().await.expect("Undo failed"));
    assert!(session.click(sq("d3")).await.expect("Click failed"));

    assert_eq!(session.current(), first_visit);
    assert_eq!(session.tree().len(), 2);
    assert_eq!(service.human_calls(), 1);
}

#[tokio::test]
async fn test_undo_restores_previous_position() {
    let (_service, mut session, _replies) = human_game().await;
    session.click(sq("d3")).await.expect("Click failed");
    let before = session.view();

    let white_move = session.legal_moves()[0];
    session.click(white_move).await.expect("Click failed");
    assert!(session.undo().await.expect("Undo failed"));

    assert_eq!(session.view(), before);
}

#[tokio::test]
async fn test_undo_at_root_is_noop() {
    let (_service, mut session, _replies) = human_game().await;
    let before = session.view();
    assert!(!session.undo().await.expect("Undo failed"));
    assert_eq!(session.view(), before);
}

#[tokio::test]
async fn test_ai_reply_is_applied() {
    let (service, mut session, mut replies) = ai_game(RulesService::new(), Player::Black).await;
    session.click(sq("d3")).await.expect("Click failed");
    assert!(session.is_opponent_thinking());

    apply_next_reply(&mut session, &mut replies).await;

    let view = session.view().expect("Game in progress");
    assert_eq!(view.moves_played, 2);
    assert_eq!(view.to_move, Some(Player::Black));
    assert!(!view.opponent_thinking);
    assert_eq!(view.last_move.map(|mv| mv.player), Some(Player::White));
    assert_eq!(service.ai_calls(), 1);
}

#[tokio::test]
async fn test_two_undos_land_two_decisions_back() {
    let (_service, mut session, mut replies) = ai_game(RulesService::new(), Player::Black).await;
    session.click(sq("d3")).await.expect("Click failed");
    apply_next_reply(&mut session, &mut replies).await;
    let second_decision = session.current();

    let next = session.legal_moves()[0];
    session.click(next).await.expect("Click failed");
    apply_next_reply(&mut session, &mut replies).await;
    assert_eq!(session.view().expect("view").moves_played, 4);

    assert!(session.undo().await.expect("Undo failed"));
    assert_eq!(session.current(), second_decision);
    assert!(session.undo().await.expect("Undo failed"));
    assert_eq!(session.current(), NodeId::ROOT);
    assert!(!session.is_opponent_thinking());
}

#[tokio::test]
async fn test_human_white_gets_opening_ai_move() {
    let (_service, mut session, mut replies) = ai_game(RulesService::new(), Player::White).await;
    assert!(session.is_opponent_thinking());
    assert!(!session.click(sq("d3")).await.expect("Click failed"));

    apply_next_reply(&mut session, &mut replies).await;

    let view = session.view().expect("Game in progress");
    assert_eq!(view.last_move, Some(Move::place(Player::Black, sq("d3"))));
    assert_eq!(view.to_move, Some(Player::White));
}

#[tokio::test]
async fn test_stale_reply_is_discarded() {
    let (_service, mut session, mut replies) = ai_game(RulesService::new(), Player::Black).await;
    session.click(sq("d3")).await.expect("Click failed");
    let late = tokio::time::timeout(Duration::from_secs(5), replies.recv())
        .await
        .expect("Opponent reply timed out")
        .expect("Reply channel closed");

    assert!(session.undo().await.expect("Undo failed"));
    let tree_before = session.tree().clone();
    let view_before = session.view();

    assert!(!session.on_opponent_reply(late).await.expect("Stale reply errored"));
    assert_eq!(session.tree(), &tree_before);
    assert_eq!(session.view(), view_before);
}

#[tokio::test]
async fn test_cancelled_request_never_delivers() {
    let (service, mut session, mut replies) = ai_game(RulesService::gated(), Player::Black).await;
    session.click(sq("d3")).await.expect("Click failed");
    assert!(session.is_opponent_thinking());

    session.undo().await.expect("Undo failed");
    assert!(!session.is_opponent_thinking());
    service.release_ai();

    let delivered = tokio::time::timeout(Duration::from_millis(100), replies.recv()).await;
    assert!(delivered.is_err(), "Cancelled request must not deliver");
}

#[tokio::test]
async fn test_jump_waits_for_explicit_resume() {
    let (service, mut session, mut replies) = ai_game(RulesService::new(), Player::Black).await;
    session.click(sq("d3")).await.expect("Click failed");
    let ai_turn = session.current();
    apply_next_reply(&mut session, &mut replies).await;
    let nodes = session.tree().len();

    session.jump_to(ai_turn).await.expect("Jump failed");
    let view = session.view().expect("Game in progress");
    assert!(view.awaiting_resume);
    assert!(!view.opponent_thinking);
    assert_eq!(service.ai_calls(), 1);

    assert!(session.resume().await.expect("Resume failed"));
    assert!(session.is_opponent_thinking());
    apply_next_reply(&mut session, &mut replies).await;

    // The deterministic AI picks the same reply, which is already in the tree.
    assert_eq!(session.tree().len(), nodes);
    assert_eq!(service.ai_calls(), 2);
}

#[tokio::test]
async fn test_jump_never_mutates_tree() {
    let (_service, mut session, _replies) = human_game().await;
    session.click(sq("d3")).await.expect("Click failed");
    let main_line = session.current();
    session.undo().await.expect("Undo failed");
    session.click(sq("c4")).await.expect("Click failed");
    let variation = session.current();
    let tree = session.tree().clone();

    session.jump_to(main_line).await.expect("Jump failed");
    assert_eq!(session.current(), main_line);
    assert_eq!(session.view().expect("view").last_move, Some(Move::place(Player::Black, sq("d3"))));
    session.jump_to(NodeId::ROOT).await.expect("Jump failed");
    session.jump_to(variation).await.expect("Jump failed");
    assert_eq!(session.tree(), &tree);

    let root = session.tree().root().expect("root");
    assert_eq!(root.main_line_child(), Some(main_line));
    assert_eq!(root.variations(), &[variation]);
    assert_eq!(
        session.continuations(NodeId::ROOT).expect("continuations"),
        vec![
            (main_line, Move::place(Player::Black, sq("d3"))),
            (variation, Move::place(Player::Black, sq("c4"))),
        ]
    );

    let missing = NodeId::new(99);
    assert!(matches!(
        session.jump_to(missing).await,
        Err(SessionError::Tree(TreeError::UnknownNode(id))) if id == missing
    ));
    assert_eq!(session.current(), variation);
}

#[tokio::test]
async fn test_forced_pass_inserts_pass_node() {
    let board = board_from_rows([
        "XO......",
        "........",
        "........",
        "........",
        "........",
        "........",
        "........",
        "XXXXXXO.",
    ]);
    let service = Arc::new(RulesService::new());
    let (mut session, _replies) = SessionController::new(Arc::clone(&service));
    let game = Snapshot::parse(&root_only_analysis(&board)).expect("Valid analysis file");
    session.restore(game).await.expect("Restore failed");
    assert_eq!(session.legal_moves(), &[sq("c1"), sq("h8")]);

    assert!(session.click(sq("c1")).await.expect("Click failed"));

    let view = session.view().expect("Game in progress");
    assert_eq!(view.last_move, Some(Move::pass(Player::White)));
    assert_eq!(view.to_move, Some(Player::Black));
    assert_eq!(view.legal_moves, vec![sq("h8")]);
    assert!(view.flipped.is_empty());
    let pass = session.tree().get(view.current).expect("pass node");
    let before_pass = session.tree().get(pass.parent().expect("parent")).expect("c1 node");
    assert_eq!(pass.board(), before_pass.board());
    assert!(before_pass.is_forced_pass());

    assert!(session.click(sq("h8")).await.expect("Click failed"));
    assert_eq!(session.phase(), Phase::GameOver);
    let result = session.result().expect("Result set");
    assert_eq!(result.winner, Some(Player::Black));
    assert_eq!(result.score.white, 0);

    // Undo leaves the game-over position, then skips the forced pass.
    assert!(session.undo().await.expect("Undo failed"));
    assert_eq!(session.phase(), Phase::Playing);
    assert!(session.result().is_none());
    assert_eq!(session.current(), view.current);
    assert!(session.undo().await.expect("Undo failed"));
    assert_eq!(session.current(), NodeId::ROOT);
}

#[tokio::test]
async fn test_double_pass_ends_game_by_disc_count() {
    let board = board_from_rows([
        "XXXXXXXX",
        "XXXXXXXX",
        "XXXXXXXX",
        "XXXXXXXX",
        "XXOOOOOO",
        "OOOOOOOO",
        "OOOOOOOO",
        "OOOOOOOO",
    ]);
    let service = Arc::new(RulesService::new());
    let (mut session, _replies) = SessionController::new(Arc::clone(&service));
    let game = Snapshot::parse(&root_only_analysis(&board)).expect("Valid analysis file");
    session.restore(game).await.expect("Restore failed");
    assert!(session.view().expect("view").awaiting_resume);

    assert!(session.resume().await.expect("Resume failed"));

    assert_eq!(session.phase(), Phase::GameOver);
    let result = session.result().expect("Result set");
    assert_eq!(result.score.black, 34);
    assert_eq!(result.score.white, 30);
    assert_eq!(result.winner, Some(Player::Black));
    assert!(session.tree().root().expect("root").is_terminal());
}

#[tokio::test]
async fn test_service_failure_leaves_state_unchanged() {
    let (service, mut session, _replies) = human_game().await;
    let before = session.view();
    service.set_offline(true);

    let result = session.click(sq("d3")).await;
    assert!(matches!(result, Err(SessionError::Service(_))));
    assert_eq!(session.view(), before);
    assert_eq!(session.tree().len(), 1);
}

#[tokio::test]
async fn test_start_failure_stays_in_setup() {
    let service = Arc::new(RulesService::new());
    service.set_offline(true);
    let (mut session, _replies) = SessionController::new(Arc::clone(&service));

    let result = session.start_game(GameSettings::default()).await;
    assert!(matches!(result, Err(SessionError::Service(_))));
    assert_eq!(session.phase(), Phase::Setup);
    assert!(matches!(session.jump_to(NodeId::ROOT).await, Err(SessionError::NoGame)));
}

#[tokio::test]
async fn test_failed_ai_reply_can_be_resumed() {
    let (service, mut session, mut replies) = ai_game(RulesService::gated(), Player::Black).await;
    session.click(sq("d3")).await.expect("Click failed");
    service.set_offline(true);
    service.release_ai();

    let reply = tokio::time::timeout(Duration::from_secs(5), replies.recv())
        .await
        .expect("Opponent reply timed out")
        .expect("Reply channel closed");
    let position = session.current();
    assert!(matches!(
        session.on_opponent_reply(reply).await,
        Err(SessionError::Service(_))
    ));
    assert_eq!(session.current(), position);
    assert!(session.awaiting_resume());

    service.set_offline(false);
    assert!(session.resume().await.expect("Resume failed"));
    service.release_ai();
    apply_next_reply(&mut session, &mut replies).await;
    assert_eq!(session.view().expect("view").moves_played, 2);
}

#[tokio::test]
async fn test_reset_returns_to_setup() {
    let (_service, mut session, _replies) = ai_game(RulesService::gated(), Player::Black).await;
    session.click(sq("d3")).await.expect("Click failed");
    assert!(session.is_opponent_thinking());

    session.reset();

    assert_eq!(session.phase(), Phase::Setup);
    assert!(session.tree().is_empty());
    assert!(!session.is_opponent_thinking());
    assert!(session.snapshot().is_none());
    assert_eq!(session.settings().mode, GameMode::HumanVsAi);
}

#[tokio::test]
async fn test_every_child_follows_from_its_parent() {
    let (_service, mut session, mut replies) = ai_game(RulesService::new(), Player::Black).await;

    for round in 0..12 {
        drain_opponent(&mut session, &mut replies).await;
        if session.phase() == Phase::GameOver {
            break;
        }
        if session.awaiting_resume() {
            session.resume().await.expect("Resume failed");
            continue;
        }
        let legal = session.legal_moves().to_vec();
        assert!(session.click(legal[round % legal.len()]).await.expect("Click failed"));
        drain_opponent(&mut session, &mut replies).await;

        if round % 3 == 2 && legal.len() > 1 {
            assert!(session.undo().await.expect("Undo failed"));
            assert_eq!(session.legal_moves(), legal.as_slice());
            let other = legal[(round + 1) % legal.len()];
            assert!(session.click(other).await.expect("Click failed"));
        }
    }
    drain_opponent(&mut session, &mut replies).await;

    let tree = session.tree();
    assert!(tree.nodes().any(|node| !node.variations().is_empty()));
    for node in tree.nodes() {
        let mut seen = HashSet::new();
        for child in node.children() {
            let mv = tree.get(*child).expect("child").mv().expect("child move");
            assert!(seen.insert(mv), "node {} repeats {mv}", node.id());
        }

        let Some(parent_id) = node.parent() else {
            assert!(node.mv().is_none());
            continue;
        };
        let parent = tree.get(parent_id).expect("parent");
        let mv = node.mv().expect("move");
        assert_eq!(parent.next_player(), Some(mv.player), "node {} out of turn", node.id());

        let expected = match mv.square {
            Some(square) => {
                let flipped = flips(parent.board(), mv.player, square);
                assert!(!flipped.is_empty(), "node {} plays illegal {mv}", node.id());
                let mut board = parent.board().clone();
                board.set(square, mv.player.cell());
                for disc in &flipped {
                    board.set(*disc, mv.player.cell());
                }
                board
            }
            None => {
                assert!(legal_moves(parent.board(), mv.player).is_empty());
                parent.board().clone()
            }
        };
        assert_eq!(node.board(), &expected, "node {} board mismatch", node.id());
    }
}

#[tokio::test]
async fn test_applied_move_survives_failed_pass_check() {
    let board = board_from_rows([
        "XO......",
        "........",
        "........",
        "........",
        "........",
        "........",
        "........",
        "XXXXXXO.",
    ]);
    let service = Arc::new(RulesService::new());
    let (mut session, _replies) = SessionController::new(Arc::clone(&service));
    let game = Snapshot::parse(&root_only_analysis(&board)).expect("Valid analysis file");
    session.restore(game).await.expect("Restore failed");
    service.set_legal_offline(true);

    assert!(session.click(sq("c1")).await.expect("Applied move is not an error"));

    let view = session.view().expect("Game in progress");
    assert_eq!(view.moves_played, 1);
    assert_eq!(view.last_move, Some(Move::place(Player::Black, sq("c1"))));
    assert_eq!(view.to_move, Some(Player::White));
    assert!(view.awaiting_resume);

    service.set_legal_offline(false);
    assert!(session.resume().await.expect("Resume failed"));
    let view = session.view().expect("Game in progress");
    assert_eq!(view.last_move, Some(Move::pass(Player::White)));
    assert_eq!(view.legal_moves, vec![sq("h8")]);
}
