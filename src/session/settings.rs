//! Session settings: who plays whom, and how strong the opponent is.

use crate::othello::Player;
use crate::service::Difficulty;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Who sits on each side of the board.
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
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum GameMode {
    /// Two humans sharing the board.
    #[default]
    HumanVsHuman,
    /// A human against the remote AI.
    HumanVsAi,
}

/// Phase of the session state machine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    /// No game started yet.
    #[default]
    Setup,
    /// A game is being played or analysed.
    Playing,
    /// The current position is terminal.
    GameOver,
}

/// Settings chosen when a game starts.
///
/// Defaults to human-vs-human, human on black, medium difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Setters)]
#[setters(prefix = "with_")]
pub struct GameSettings {
    /// Game mode.
    pub mode: GameMode,
    /// Side the human plays in human-vs-ai mode.
    pub human_side: Player,
    /// Opponent strength in human-vs-ai mode.
    pub difficulty: Difficulty,
}

impl GameSettings {
    /// Creates human-vs-ai settings with the human on `human_side`.
    #[instrument]
    pub fn against_ai(human_side: Player, difficulty: Difficulty) -> Self {
        Self {
            mode: GameMode::HumanVsAi,
            human_side,
            difficulty,
        }
    }

    /// Side played by the remote AI, if any.
    pub fn opponent_side(&self) -> Option<Player> {
        match self.mode {
            GameMode::HumanVsHuman => None,
            GameMode::HumanVsAi => Some(self.human_side.opponent()),
        }
    }

    /// Returns `true` when `player` is controlled by the remote AI.
    pub fn is_opponent(&self, player: Player) -> bool {
        self.opponent_side() == Some(player)
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            mode: GameMode::HumanVsHuman,
            human_side: Player::Black,
            difficulty: Difficulty::Medium,
        }
    }
}
