//! Tests for the position tree store.

mod common;

use common::{legal_moves, sq};
use strictly_othello::{Board, Move, NodeId, Player, PositionTree, Square, TreeError};

fn seeded() -> PositionTree {
    let mut tree = PositionTree::new();
    let board = Board::initial();
    let legal = legal_moves(&board, Player::Black);
    tree.create_root(board, Some(legal));
    tree
}

fn add(tree: &mut PositionTree, parent: NodeId, player: Player, square: Option<Square>) -> NodeId {
    let mv = Move {
        player,
        square,
    };
    tree.add_child(
        parent,
        mv,
        Board::initial(),
        Vec::new(),
        Some(player.opponent()),
        Vec::new(),
    )
    .expect("Add failed")
}

#[test]
fn test_main_line_follows_first_children() {
    let mut tree = seeded();
    let d3 = add(&mut tree, NodeId::ROOT, Player::Black, Some(sq("d3")));
    let c4 = add(&mut tree, NodeId::ROOT, Player::Black, Some(sq("c4")));
    let c5 = add(&mut tree, d3, Player::White, Some(sq("c5")));
    add(&mut tree, c4, Player::White, Some(sq("c3")));

    let line: Vec<NodeId> = tree.main_line().iter().map(|node| node.id()).collect();
    assert_eq!(line, vec![NodeId::ROOT, d3, c5]);

    let path: Vec<NodeId> = tree
        .path_to_root(c5)
        .expect("Path")
        .iter()
        .map(|node| node.id())
        .collect();
    assert_eq!(path, vec![NodeId::ROOT, d3, c5]);
    assert_eq!(tree.moves_played(c5), Ok(2));
    assert_eq!(tree.moves_played(NodeId::ROOT), Ok(0));
}

#[test]
fn test_duplicate_sibling_move_is_refused() {
    let mut tree = seeded();
    add(&mut tree, NodeId::ROOT, Player::Black, Some(sq("d3")));

    let result = tree.add_child(
        NodeId::ROOT,
        Move::place(Player::Black, sq("d3")),
        Board::initial(),
        Vec::new(),
        Some(Player::White),
        Vec::new(),
    );
    assert!(matches!(result, Err(TreeError::DuplicateChild { .. })));
    assert_eq!(tree.len(), 2);
}

#[test]
fn test_ids_are_never_reused() {
    let mut tree = seeded();
    let first = add(&mut tree, NodeId::ROOT, Player::Black, Some(sq("d3")));
    let second = add(&mut tree, NodeId::ROOT, Player::Black, Some(sq("c4")));
    assert_ne!(first, second);
    assert!(second.raw() > first.raw());
    assert!(tree.get(NodeId::new(10)).is_err());
}

#[test]
fn test_mark_terminal_clears_side_to_move() {
    let mut tree = seeded();
    let pass = add(&mut tree, NodeId::ROOT, Player::Black, None);
    assert!(tree.get(pass).expect("node").mv().expect("move").is_pass());

    tree.mark_terminal(pass).expect("Mark failed");

    let node = tree.get(pass).expect("node");
    assert!(node.is_terminal());
    assert_eq!(node.legal_moves(), Some(&[][..]));
    assert_eq!(
        tree.mark_terminal(NodeId::new(50)),
        Err(TreeError::UnknownNode(NodeId::new(50)))
    );
}

#[test]
fn test_from_nodes_rebuilds_identical_tree() {
    let mut tree = seeded();
    let d3 = add(&mut tree, NodeId::ROOT, Player::Black, Some(sq("d3")));
    add(&mut tree, d3, Player::White, Some(sq("c5")));
    add(&mut tree, NodeId::ROOT, Player::Black, Some(sq("f5")));

    let rebuilt = PositionTree::from_nodes(tree.nodes().cloned().collect()).expect("Rebuild failed");
    assert_eq!(rebuilt, tree);

    let mut grown = rebuilt;
    let next = add(&mut grown, d3, Player::White, Some(sq("e3")));
    assert_eq!(next.raw(), 4);
}

#[test]
fn test_node_id_notation() {
    assert_eq!(NodeId::ROOT.to_string(), "root");
    assert_eq!(NodeId::new(7).to_string(), "7");
    assert_eq!("root".parse::<NodeId>(), Ok(NodeId::ROOT));
    assert_eq!("12".parse::<NodeId>(), Ok(NodeId::new(12)));
    assert!("twelve".parse::<NodeId>().is_err());
}
