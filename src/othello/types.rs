//! Core domain types for Othello.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::instrument;

/// Board edge length.
pub const BOARD_SIZE: usize = 8;

/// Side in the game.
///
/// Encoded as `1` (black) and `2` (white) on the wire and in save files.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(into = "u8", try_from = "u8")]
#[strum(ascii_case_insensitive)]
pub enum Player {
    /// Black (moves first).
    Black,
    /// White.
    White,
}

impl Player {
    /// Returns the opponent player.
    pub fn opponent(self) -> Self {
        match self {
            Player::Black => Player::White,
            Player::White => Player::Black,
        }
    }

    /// Returns the cell this player's discs occupy.
    pub fn cell(self) -> Cell {
        match self {
            Player::Black => Cell::Black,
            Player::White => Cell::White,
        }
    }
}

impl From<Player> for u8 {
    fn from(player: Player) -> Self {
        match player {
            Player::Black => 1,
            Player::White => 2,
        }
    }
}

impl TryFrom<u8> for Player {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Player::Black),
            2 => Ok(Player::White),
            other => Err(format!("invalid player code {other}, expected 1 or 2")),
        }
    }
}

/// A cell on the Othello board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Cell {
    /// Empty cell.
    #[default]
    Empty,
    /// Black disc.
    Black,
    /// White disc.
    White,
}

impl From<Cell> for u8 {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Empty => 0,
            Cell::Black => 1,
            Cell::White => 2,
        }
    }
}

impl TryFrom<u8> for Cell {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Cell::Empty),
            1 => Ok(Cell::Black),
            2 => Ok(Cell::White),
            other => Err(format!("invalid cell value {other}, expected 0, 1 or 2")),
        }
    }
}

/// A square on the board, addressed by row and column (both `0..8`).
///
/// Serialized as a `[row, col]` pair. Written in notation as a file letter
/// taken from the column and a rank number taken from the row, so
/// `Square::new(2, 3)` is `d3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "[u8; 2]", try_from = "[u8; 2]")]
pub struct Square {
    row: u8,
    col: u8,
}

impl Square {
    /// Creates a square, or `None` when either coordinate is off the board.
    pub fn new(row: u8, col: u8) -> Option<Self> {
        if (row as usize) < BOARD_SIZE && (col as usize) < BOARD_SIZE {
            Some(Self { row, col })
        } else {
            None
        }
    }

    /// Row index (`0` is rank 1).
    pub fn row(self) -> u8 {
        self.row
    }

    /// Column index (`0` is file a).
    pub fn col(self) -> u8 {
        self.col
    }

    /// All 64 squares in row-major order.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..BOARD_SIZE as u8).flat_map(|row| (0..BOARD_SIZE as u8).map(move |col| Square { row, col }))
    }
}

impl From<Square> for [u8; 2] {
    fn from(square: Square) -> Self {
        [square.row, square.col]
    }
}

impl TryFrom<[u8; 2]> for Square {
    type Error = String;

    fn try_from([row, col]: [u8; 2]) -> Result<Self, Self::Error> {
        Square::new(row, col).ok_or_else(|| format!("square ({row}, {col}) is off the board"))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.col) as char, self.row + 1)
    }
}

/// Error parsing square notation such as `d3`.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Invalid square notation: '{}'", input)]
pub struct SquareParseError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for Square {
    type Err = SquareParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || SquareParseError {
            input: s.to_string(),
        };
        let lower = s.trim().to_ascii_lowercase();
        let mut chars = lower.chars();
        let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(err());
        };
        if !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
            return Err(err());
        }
        let col = file as u8 - b'a';
        let row = rank as u8 - b'1';
        Square::new(row, col).ok_or_else(err)
    }
}

/// 8x8 Othello board.
///
/// Boards are plain values: every position in the move tree owns its own copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Creates an empty board.
    pub fn empty() -> Self {
        Self {
            cells: [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// Creates the standard starting position: white on d4 and e5, black on
    /// e4 and d5.
    #[instrument]
    pub fn initial() -> Self {
        let mut board = Self::empty();
        board.cells[3][3] = Cell::White;
        board.cells[3][4] = Cell::Black;
        board.cells[4][3] = Cell::Black;
        board.cells[4][4] = Cell::White;
        board
    }

    /// Gets the cell at the given square.
    pub fn get(&self, square: Square) -> Cell {
        self.cells[square.row as usize][square.col as usize]
    }

    /// Sets the cell at the given square.
    pub fn set(&mut self, square: Square, cell: Cell) {
        self.cells[square.row as usize][square.col as usize] = cell;
    }

    /// Counts the discs of both sides.
    pub fn score(&self) -> Score {
        let mut score = Score::default();
        for cell in self.cells.iter().flatten() {
            match cell {
                Cell::Black => score.black += 1,
                Cell::White => score.white += 1,
                Cell::Empty => {}
            }
        }
        score
    }

    /// Formats the board as a human-readable grid.
    ///
    /// Squares listed in `marks` (typically legal destinations) are drawn as `*`.
    pub fn display(&self, marks: &[Square]) -> String {
        let mut result = String::from("  a b c d e f g h\n");
        for (row, cells) in self.cells.iter().enumerate() {
            result.push_str(&(row + 1).to_string());
            for (col, cell) in cells.iter().enumerate() {
                let symbol = match cell {
                    Cell::Black => 'X',
                    Cell::White => 'O',
                    Cell::Empty => {
                        let marked = marks
                            .iter()
                            .any(|sq| sq.row as usize == row && sq.col as usize == col);
                        if marked { '*' } else { '.' }
                    }
                };
                result.push(' ');
                result.push(symbol);
            }
            result.push('\n');
        }
        result
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

/// Disc counts for both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Score {
    /// Black discs.
    pub black: u8,
    /// White discs.
    pub white: u8,
}

impl Score {
    /// Creates a score.
    pub fn new(black: u8, white: u8) -> Self {
        Self { black, white }
    }

    /// Side with strictly more discs, or `None` for a draw.
    pub fn leader(self) -> Option<Player> {
        match self.black.cmp(&self.white) {
            std::cmp::Ordering::Greater => Some(Player::Black),
            std::cmp::Ordering::Less => Some(Player::White),
            std::cmp::Ordering::Equal => None,
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Black {} - White {}", self.black, self.white)
    }
}

/// Final result of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    /// Disc counts on the terminal board.
    pub score: Score,
    /// Winner, or `None` for a draw.
    pub winner: Option<Player>,
}

impl GameResult {
    /// Derives the result from the terminal board's disc count.
    #[instrument(skip(board))]
    pub fn from_board(board: &Board) -> Self {
        let score = board.score();
        Self {
            score,
            winner: score.leader(),
        }
    }

    /// Human-readable outcome line.
    pub fn summary(&self) -> String {
        match self.winner {
            Some(player) => format!("{player} wins"),
            None => "Draw".to_string(),
        }
    }
}
