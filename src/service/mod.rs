//! Move validity client: the remote rules and AI service.
//!
//! The crate contains no Othello rules engine. Applying a move, choosing an AI
//! reply and listing legal destinations are all delegated to a [`MoveService`].

mod error;
mod http;

pub use error::{ServiceError, ServiceErrorKind};
pub use http::HttpMoveService;

use crate::othello::{Board, Player, Square};
use serde::{Deserialize, Serialize};

/// Strength tag forwarded to the AI endpoint.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    /// Weak opponent.
    Easy,
    /// Default strength.
    #[default]
    Medium,
    /// Strongest opponent.
    Hard,
}

/// Result of applying a move through the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Board after the move.
    pub board: Board,
    /// Side to move next, `None` once the game is over.
    pub next_player: Option<Player>,
    /// Legal destinations for `next_player`.
    pub legal_moves: Vec<Square>,
    /// Squares whose discs changed colour.
    pub flipped: Vec<Square>,
    /// Set when the service reports the game has ended.
    pub game_over: bool,
    /// Winner reported by the service, `None` for a draw or an unfinished game.
    pub winner: Option<Player>,
}

/// Result of asking the service for an AI move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiMoveOutcome {
    /// Square the AI played, `None` when it passed.
    pub square: Option<Square>,
    /// The position after the AI's move.
    pub outcome: MoveOutcome,
}

/// Remote operations backing a game session.
///
/// Implementations must be shareable across tasks: opponent requests run on a
/// spawned task so the caller can abandon them.
#[async_trait::async_trait]
pub trait MoveService: Send + Sync + 'static {
    /// Applies a human placement at `square` for `player`.
    async fn apply_human_move(
        &self,
        board: &Board,
        player: Player,
        square: Square,
    ) -> Result<MoveOutcome, ServiceError>;

    /// Lets the service choose and apply a move for `player`.
    async fn apply_ai_move(
        &self,
        board: &Board,
        player: Player,
        difficulty: Difficulty,
    ) -> Result<AiMoveOutcome, ServiceError>;

    /// Lists the legal destinations for `player` on `board`.
    async fn query_legal_moves(
        &self,
        board: &Board,
        player: Player,
    ) -> Result<Vec<Square>, ServiceError>;
}
