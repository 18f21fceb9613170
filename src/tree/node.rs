//! Position nodes of the move tree.

use crate::othello::{Board, Move, Player, Square};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable handle of a node in the move tree.
///
/// Handles are never reused within a tree. The root always has handle `0`
/// and displays as `root`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Handle of the start-of-game node.
    pub const ROOT: NodeId = NodeId(0);

    /// Wraps a raw handle.
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw handle.
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Returns `true` for the root handle.
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "root")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl FromStr for NodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("root") {
            return Ok(Self::ROOT);
        }
        s.parse().map(Self)
    }
}

/// A position in the move tree: the board reached by one ply from its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Node {
    /// Node handle.
    #[getter(copy)]
    pub(super) id: NodeId,
    /// Move that produced this position, `None` on the root.
    #[serde(rename = "move")]
    #[getter(copy)]
    pub(super) mv: Option<Move>,
    /// Board after the move.
    pub(super) board: Board,
    /// Squares flipped by the move.
    #[serde(default)]
    pub(super) flipped: Vec<Square>,
    /// Side to move, `None` once the game is over.
    #[getter(copy)]
    pub(super) next_player: Option<Player>,
    /// `None` when the legal replies were never cached (older or hand-made files).
    #[serde(default)]
    #[getter(skip)]
    pub(super) legal_moves: Option<Vec<Square>>,
    /// Parent handle, `None` on the root.
    #[getter(copy)]
    pub(super) parent: Option<NodeId>,
    /// Child handles in creation order.
    #[serde(default)]
    pub(super) children: Vec<NodeId>,
}

impl Node {
    /// Cached legal destinations for the side to move, if known.
    pub fn legal_moves(&self) -> Option<&[Square]> {
        self.legal_moves.as_deref()
    }

    /// Returns `true` for the root.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Returns `true` when no side is left to move.
    pub fn is_terminal(&self) -> bool {
        self.next_player.is_none()
    }

    /// Main line continuation (first child), if any.
    pub fn main_line_child(&self) -> Option<NodeId> {
        self.children.first().copied()
    }

    /// Variation children (all children except the first).
    pub fn variations(&self) -> &[NodeId] {
        self.children.get(1..).unwrap_or(&[])
    }

    /// Returns `true` when the side to move has no placement available, i.e.
    /// it must pass. Unknown legal moves count as "not forced".
    pub fn is_forced_pass(&self) -> bool {
        !self.is_terminal() && matches!(self.legal_moves(), Some([]))
    }
}
