//! Linear game record: the main line written out as plain move notation.

use crate::othello::{GameResult, Move, Player};
use crate::session::{GameMode, GameSettings};
use crate::tree::PositionTree;
use std::fmt;
use tracing::instrument;

/// The main line of a tree, without variations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearRecord {
    /// Settings of the game.
    pub settings: GameSettings,
    /// Main-line moves in order, passes included.
    pub moves: Vec<Move>,
    /// Final result when the main line ends in a terminal position.
    pub result: Option<GameResult>,
}

impl LinearRecord {
    /// Extracts the main line (first child at every step) of `tree`.
    #[instrument(skip(tree, settings), fields(nodes = tree.len()))]
    pub fn from_tree(tree: &PositionTree, settings: GameSettings) -> Self {
        let line = tree.main_line();
        let moves = line.iter().filter_map(|node| node.mv()).collect();
        let result = line
            .last()
            .filter(|node| node.is_terminal())
            .map(|node| GameResult::from_board(node.board()));
        Self {
            settings,
            moves,
            result,
        }
    }

    /// Renders the record as text.
    ///
    /// One numbered line per turn (`1. d3 c5`), `...` standing in for black
    /// when a turn opens with a white move, and `#` comment lines with the
    /// game metadata at the end.
    pub fn to_notation(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LinearRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut turn = 1;
        let mut moves = self.moves.iter().peekable();
        while let Some(mv) = moves.next() {
            match mv.player {
                Player::Black => match moves.next_if(|next| next.player == Player::White) {
                    Some(reply) => writeln!(f, "{turn}. {} {}", mv.notation(), reply.notation())?,
                    None => writeln!(f, "{turn}. {}", mv.notation())?,
                },
                Player::White => writeln!(f, "{turn}. ... {}", mv.notation())?,
            }
            turn += 1;
        }

        if !self.moves.is_empty() {
            writeln!(f)?;
        }
        match self.settings.mode {
            GameMode::HumanVsHuman => writeln!(f, "# Mode: {}", self.settings.mode)?,
            GameMode::HumanVsAi => writeln!(
                f,
                "# Mode: {} (human: {}, difficulty: {})",
                self.settings.mode, self.settings.human_side, self.settings.difficulty
            )?,
        }
        writeln!(f, "# Moves: {}", self.moves.len())?;
        match &self.result {
            Some(result) => {
                writeln!(f, "# Final score: {}", result.score)?;
                writeln!(f, "# Result: {}", result.summary())
            }
            None => writeln!(f, "# Result: unfinished"),
        }
    }
}
