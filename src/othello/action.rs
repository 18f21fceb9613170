//! First-class move type for Othello.
//!
//! A move is either a disc placement or a pass. Passes are recorded in the move
//! tree like any other ply so the turn order stays explicit.

use super::{Player, Square};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A single ply: the player acting and the square played, or `None` for a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// The player making the move.
    pub player: Player,
    /// The square played, `None` when the player passed.
    pub square: Option<Square>,
}

impl Move {
    /// Creates a placement.
    #[instrument]
    pub fn place(player: Player, square: Square) -> Self {
        Self {
            player,
            square: Some(square),
        }
    }

    /// Creates a pass.
    #[instrument]
    pub fn pass(player: Player) -> Self {
        Self {
            player,
            square: None,
        }
    }

    /// Returns `true` for a pass.
    pub fn is_pass(&self) -> bool {
        self.square.is_none()
    }

    /// Move notation: the square (`d3`) or `pass`.
    pub fn notation(&self) -> String {
        match self.square {
            Some(square) => square.to_string(),
            None => "pass".to_string(),
        }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.player, self.notation())
    }
}
