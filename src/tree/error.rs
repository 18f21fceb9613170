//! Move tree error types.

use super::NodeId;
use crate::othello::Move;

/// Error raised by [`PositionTree`](super::PositionTree) operations.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum TreeError {
    /// No node has this handle.
    #[display("Unknown node {}", _0)]
    UnknownNode(NodeId),

    /// The parent already has a child for this move.
    #[display("Node {} already has a child for {}", parent, mv)]
    DuplicateChild {
        /// Parent handle.
        parent: NodeId,
        /// The repeated move.
        mv: Move,
    },

    /// A node table failed structural validation.
    #[display("Malformed move tree: {}", _0)]
    Malformed(String),
}

impl std::error::Error for TreeError {}
