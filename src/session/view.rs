//! Read-only view of the session for front-ends.

use super::Phase;
use crate::othello::{Board, GameResult, Move, Player, Score, Square};
use crate::tree::NodeId;

/// Everything a front-end needs to redraw after a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    /// Current position.
    pub current: NodeId,
    /// Board at the current position.
    pub board: Board,
    /// Side to move, `None` when the position is terminal.
    pub to_move: Option<Player>,
    /// Legal destinations for the side to move.
    pub legal_moves: Vec<Square>,
    /// Live disc count.
    pub score: Score,
    /// Session phase.
    pub phase: Phase,
    /// Final result, only in [`Phase::GameOver`].
    pub result: Option<GameResult>,
    /// Move that produced the current position.
    pub last_move: Option<Move>,
    /// Squares flipped by that move.
    pub flipped: Vec<Square>,
    /// Plies from the start of the game.
    pub moves_played: usize,
    /// An opponent request is outstanding.
    pub opponent_thinking: bool,
    /// A forced pass or opponent move is waiting for an explicit resume.
    pub awaiting_resume: bool,
}
