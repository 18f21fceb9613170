mod action;
mod types;

pub use action::Move;
pub use types::{
    BOARD_SIZE, Board, Cell, GameResult, Player, Score, Square, SquareParseError,
};
