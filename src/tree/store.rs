//! Arena-backed store of explored positions.

use super::{Node, NodeId, TreeError};
use crate::othello::{Board, Move, Player, Square};
use std::collections::{BTreeMap, HashSet, VecDeque};
use tracing::{debug, info, instrument, warn};

/// Branching history of a game.
///
/// Nodes live in a table keyed by [`NodeId`]; parent and child links are
/// handles into that table. Nodes are only ever added, so handles stay valid
/// for the lifetime of the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionTree {
    nodes: BTreeMap<NodeId, Node>,
    next_id: u32,
}

impl PositionTree {
    /// Creates an empty tree without a root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the root node for `board` with black to move.
    ///
    /// Does nothing when the tree already has a root.
    #[instrument(skip(self, board, legal_moves))]
    pub fn create_root(&mut self, board: Board, legal_moves: Option<Vec<Square>>) -> NodeId {
        if self.nodes.contains_key(&NodeId::ROOT) {
            debug!("Root already exists");
            return NodeId::ROOT;
        }
        self.nodes.insert(
            NodeId::ROOT,
            Node {
                id: NodeId::ROOT,
                mv: None,
                board,
                flipped: Vec::new(),
                next_player: Some(Player::Black),
                legal_moves,
                parent: None,
                children: Vec::new(),
            },
        );
        self.next_id = self.next_id.max(1);
        info!("Created root position");
        NodeId::ROOT
    }

    /// Appends a new child position under `parent` and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownNode`] when the parent does not exist and
    /// [`TreeError::DuplicateChild`] when the parent already has a child for
    /// `mv` (use [`PositionTree::find_existing_child`] first).
    #[instrument(skip(self, board, flipped, legal_moves), fields(parent = %parent, mv = %mv))]
    pub fn add_child(
        &mut self,
        parent: NodeId,
        mv: Move,
        board: Board,
        flipped: Vec<Square>,
        next_player: Option<Player>,
        legal_moves: Vec<Square>,
    ) -> Result<NodeId, TreeError> {
        if !self.nodes.contains_key(&parent) {
            warn!("Parent node not found");
            return Err(TreeError::UnknownNode(parent));
        }
        if self.find_existing_child(parent, &mv).is_some() {
            warn!("Parent already has a child for this move");
            return Err(TreeError::DuplicateChild { parent, mv });
        }

        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                id,
                mv: Some(mv),
                board,
                flipped,
                next_player,
                legal_moves: Some(legal_moves),
                parent: Some(parent),
                children: Vec::new(),
            },
        );
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.push(id);
        }

        debug!(id = %id, "Added child position");
        Ok(id)
    }

    /// Finds the child of `parent` produced by exactly `mv`.
    pub fn find_existing_child(&self, parent: NodeId, mv: &Move) -> Option<NodeId> {
        let parent = self.nodes.get(&parent)?;
        parent
            .children
            .iter()
            .copied()
            .find(|child| self.nodes.get(child).and_then(|n| n.mv.as_ref()) == Some(mv))
    }

    /// Gets a node by handle.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownNode`] when no node has this handle.
    pub fn get(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.nodes.get(&id).ok_or(TreeError::UnknownNode(id))
    }

    /// Returns the root, if the tree has been seeded.
    pub fn root(&self) -> Option<&Node> {
        self.nodes.get(&NodeId::ROOT)
    }

    /// Returns `true` when a node has this handle.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` before the root is created.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in handle order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Nodes from the root down to `id`, both included.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownNode`] when `id` (or a broken ancestor link)
    /// is not in the tree.
    pub fn path_to_root(&self, id: NodeId) -> Result<Vec<&Node>, TreeError> {
        let mut path = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.get(current)?;
            path.push(node);
            cursor = node.parent;
        }
        path.reverse();
        Ok(path)
    }

    /// Plies played to reach `id`; the root itself is not a move.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownNode`] when `id` is not in the tree.
    pub fn moves_played(&self, id: NodeId) -> Result<usize, TreeError> {
        Ok(self.path_to_root(id)?.len().saturating_sub(1))
    }

    /// Root followed by the first child of each node, down to the first leaf.
    pub fn main_line(&self) -> Vec<&Node> {
        let mut line = Vec::new();
        let mut cursor = self.root();
        while let Some(node) = cursor {
            line.push(node);
            cursor = node.main_line_child().and_then(|child| self.nodes.get(&child));
        }
        line
    }

    /// Records that `id` turned out to be terminal (neither side can move).
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownNode`] when `id` is not in the tree.
    #[instrument(skip(self))]
    pub fn mark_terminal(&mut self, id: NodeId) -> Result<(), TreeError> {
        let node = self.nodes.get_mut(&id).ok_or(TreeError::UnknownNode(id))?;
        node.next_player = None;
        node.legal_moves = Some(Vec::new());
        info!("Position marked terminal");
        Ok(())
    }

    /// Rebuilds a tree from a node table, checking every structural invariant.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::Malformed`] describing the first violation found.
    #[instrument(skip(nodes), fields(count = nodes.len()))]
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self, TreeError> {
        let malformed = |message: String| {
            warn!(reason = %message, "Rejecting node table");
            TreeError::Malformed(message)
        };

        let mut table = BTreeMap::new();
        for node in nodes {
            let id = node.id;
            if table.insert(id, node).is_some() {
                return Err(malformed(format!("duplicate node id {id}")));
            }
        }

        let root = table
            .get(&NodeId::ROOT)
            .ok_or_else(|| malformed("missing root node".to_string()))?;
        if root.parent.is_some() || root.mv.is_some() {
            return Err(malformed("root node must have no parent and no move".to_string()));
        }
        if root.next_player == Some(Player::White) {
            return Err(malformed("black must move first at the root".to_string()));
        }

        for node in table.values() {
            if !node.id.is_root() {
                let parent_id = node
                    .parent
                    .ok_or_else(|| malformed(format!("node {} has no parent", node.id)))?;
                let parent = table.get(&parent_id).ok_or_else(|| {
                    malformed(format!("node {} points at missing parent {parent_id}", node.id))
                })?;
                if !parent.children.contains(&node.id) {
                    return Err(malformed(format!(
                        "parent {parent_id} does not list node {} as a child",
                        node.id
                    )));
                }
                let mv = node
                    .mv
                    .ok_or_else(|| malformed(format!("node {} has no move", node.id)))?;
                if parent.next_player != Some(mv.player) {
                    return Err(malformed(format!(
                        "node {} was played by {} out of turn",
                        node.id, mv.player
                    )));
                }
            }

            let mut seen_children = HashSet::new();
            let mut seen_moves = HashSet::new();
            for child_id in &node.children {
                if !seen_children.insert(*child_id) {
                    return Err(malformed(format!(
                        "node {} lists child {child_id} twice",
                        node.id
                    )));
                }
                let child = table.get(child_id).ok_or_else(|| {
                    malformed(format!("node {} lists missing child {child_id}", node.id))
                })?;
                if child.parent != Some(node.id) {
                    return Err(malformed(format!(
                        "child {child_id} does not point back at node {}",
                        node.id
                    )));
                }
                if let Some(mv) = child.mv {
                    if !seen_moves.insert(mv) {
                        return Err(malformed(format!(
                            "node {} has two children for {mv}",
                            node.id
                        )));
                    }
                }
            }
        }

        let mut reached = 0usize;
        let mut queue = VecDeque::from([NodeId::ROOT]);
        while let Some(id) = queue.pop_front() {
            reached += 1;
            if let Some(node) = table.get(&id) {
                queue.extend(node.children.iter().copied());
            }
        }
        if reached != table.len() {
            return Err(malformed(format!(
                "{} nodes are unreachable from the root",
                table.len().saturating_sub(reached)
            )));
        }

        let next_id = table
            .keys()
            .map(|id| id.raw())
            .max()
            .map_or(1, |max| max.saturating_add(1));
        info!(nodes = table.len(), "Rebuilt move tree");
        Ok(Self {
            nodes: table,
            next_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(notation: &str) -> Square {
        notation.parse().expect("valid square")
    }

    fn seeded() -> PositionTree {
        let mut tree = PositionTree::new();
        tree.create_root(Board::initial(), Some(vec![sq("d3"), sq("c4")]));
        tree
    }

    #[test]
    fn create_root_is_idempotent() {
        let mut tree = seeded();
        let before = tree.clone();
        tree.create_root(Board::empty(), None);
        assert_eq!(tree, before);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn add_child_rejects_unknown_parent() {
        let mut tree = seeded();
        let result = tree.add_child(
            NodeId::new(42),
            Move::place(Player::Black, sq("d3")),
            Board::initial(),
            Vec::new(),
            Some(Player::White),
            Vec::new(),
        );
        assert_eq!(result, Err(TreeError::UnknownNode(NodeId::new(42))));
    }

    #[test]
    fn children_keep_creation_order() {
        let mut tree = seeded();
        let first = tree
            .add_child(
                NodeId::ROOT,
                Move::place(Player::Black, sq("d3")),
                Board::initial(),
                Vec::new(),
                Some(Player::White),
                Vec::new(),
            )
            .expect("first child");
        let second = tree
            .add_child(
                NodeId::ROOT,
                Move::place(Player::Black, sq("c4")),
                Board::initial(),
                Vec::new(),
                Some(Player::White),
                Vec::new(),
            )
            .expect("second child");

        let root = tree.root().expect("root");
        assert_eq!(root.main_line_child(), Some(first));
        assert_eq!(root.variations(), &[second]);
        assert_eq!(
            tree.find_existing_child(NodeId::ROOT, &Move::place(Player::Black, sq("c4"))),
            Some(second)
        );
        assert_eq!(tree.moves_played(second), Ok(1));
    }

    #[test]
    fn from_nodes_requires_root() {
        let mut tree = seeded();
        tree.add_child(
            NodeId::ROOT,
            Move::place(Player::Black, sq("d3")),
            Board::initial(),
            Vec::new(),
            Some(Player::White),
            Vec::new(),
        )
        .expect("child");
        let without_root: Vec<Node> = tree.nodes().filter(|n| !n.is_root()).cloned().collect();
        assert!(matches!(
            PositionTree::from_nodes(without_root),
            Err(TreeError::Malformed(_))
        ));
    }
}
