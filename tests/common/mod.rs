//! Shared fixtures: an in-process rules service and board builders.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use strictly_othello::{
    AiMoveOutcome, Board, Cell, Difficulty, MoveOutcome, MoveService, Player, ServiceError, Square,
};
use tokio::sync::Semaphore;

const DIRECTIONS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Discs flipped if `player` plays `square`; empty when the move is illegal.
pub fn flips(board: &Board, player: Player, square: Square) -> Vec<Square> {
    if board.get(square) != Cell::Empty {
        return Vec::new();
    }
    let mut flipped = Vec::new();
    for (dr, dc) in DIRECTIONS {
        let mut run = Vec::new();
        let mut row = square.row() as i8 + dr;
        let mut col = square.col() as i8 + dc;
        while let Some(next) = u8::try_from(row)
            .ok()
            .zip(u8::try_from(col).ok())
            .and_then(|(r, c)| Square::new(r, c))
        {
            match board.get(next) {
                cell if cell == player.opponent().cell() => run.push(next),
                cell if cell == player.cell() => {
                    flipped.extend(run.iter().copied());
                    break;
                }
                _ => break,
            }
            row += dr;
            col += dc;
        }
    }
    flipped
}

/// Legal destinations in row-major order.
pub fn legal_moves(board: &Board, player: Player) -> Vec<Square> {
    Square::all()
        .filter(|square| !flips(board, player, *square).is_empty())
        .collect()
}

fn outcome(board: Board, mover: Player, flipped: Vec<Square>) -> MoveOutcome {
    let replies = legal_moves(&board, mover.opponent());
    let game_over = replies.is_empty() && legal_moves(&board, mover).is_empty();
    MoveOutcome {
        next_player: if game_over { None } else { Some(mover.opponent()) },
        legal_moves: replies,
        flipped,
        game_over,
        winner: if game_over { board.score().leader() } else { None },
        board,
    }
}

fn place(board: &Board, player: Player, square: Square) -> Result<MoveOutcome, ServiceError> {
    let flipped = flips(board, player, square);
    if flipped.is_empty() {
        return Err(ServiceError::rejected(format!("illegal move {square}")));
    }
    let mut next = board.clone();
    next.set(square, player.cell());
    for disc in &flipped {
        next.set(*disc, player.cell());
    }
    Ok(outcome(next, player, flipped))
}

/// Reference Othello rules behind the [`MoveService`] seam.
///
/// The AI plays the first legal square in row-major order. When gated, each
/// AI reply waits for one [`RulesService::release_ai`].
#[derive(Debug, Default)]
pub struct RulesService {
    offline: AtomicBool,
    legal_offline: AtomicBool,
    ai_gate: Option<Semaphore>,
    human_calls: AtomicUsize,
    ai_calls: AtomicUsize,
    legal_calls: AtomicUsize,
}

impl RulesService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self {
            ai_gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    pub fn release_ai(&self) {
        if let Some(gate) = &self.ai_gate {
            gate.add_permits(1);
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Makes only legal-move queries fail, leaving move application up.
    pub fn set_legal_offline(&self, offline: bool) {
        self.legal_offline.store(offline, Ordering::SeqCst);
    }

    pub fn human_calls(&self) -> usize {
        self.human_calls.load(Ordering::SeqCst)
    }

    pub fn ai_calls(&self) -> usize {
        self.ai_calls.load(Ordering::SeqCst)
    }

    pub fn legal_calls(&self) -> usize {
        self.legal_calls.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), ServiceError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(ServiceError::unreachable("connection refused"))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl MoveService for RulesService {
    async fn apply_human_move(
        &self,
        board: &Board,
        player: Player,
        square: Square,
    ) -> Result<MoveOutcome, ServiceError> {
        self.human_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        place(board, player, square)
    }

    async fn apply_ai_move(
        &self,
        board: &Board,
        player: Player,
        _difficulty: Difficulty,
    ) -> Result<AiMoveOutcome, ServiceError> {
        self.ai_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.ai_gate {
            gate.acquire()
                .await
                .map_err(|_| ServiceError::unreachable("gate closed"))?
                .forget();
        }
        self.check_online()?;
        match legal_moves(board, player).first().copied() {
            Some(square) => {
                let outcome = place(board, player, square)?;
                Ok(AiMoveOutcome {
                    square: Some(square),
                    outcome,
                })
            }
            None => Ok(AiMoveOutcome {
                square: None,
                outcome: outcome(board.clone(), player, Vec::new()),
            }),
        }
    }

    async fn query_legal_moves(
        &self,
        board: &Board,
        player: Player,
    ) -> Result<Vec<Square>, ServiceError> {
        self.legal_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        if self.legal_offline.load(Ordering::SeqCst) {
            return Err(ServiceError::unreachable("connection reset"));
        }
        Ok(legal_moves(board, player))
    }
}

pub fn sq(notation: &str) -> Square {
    notation.parse().expect("valid square")
}

/// Builds a board from eight rows of `X` (black), `O` (white) and `.`.
pub fn board_from_rows(rows: [&str; 8]) -> Board {
    let mut board = Board::empty();
    for (row, line) in rows.iter().enumerate() {
        for (col, symbol) in line.chars().enumerate() {
            let square = Square::new(row as u8, col as u8).expect("on board");
            match symbol {
                'X' => board.set(square, Cell::Black),
                'O' => board.set(square, Cell::White),
                _ => {}
            }
        }
    }
    board
}

/// Analysis file holding a single root position with black to move.
pub fn root_only_analysis(board: &Board) -> String {
    serde_json::json!({
        "format": strictly_othello::FORMAT_TAG,
        "version": strictly_othello::SCHEMA_VERSION,
        "saved_at": "2026-01-01T00:00:00Z",
        "settings": { "mode": "human-vs-human", "human_side": 1, "difficulty": "medium" },
        "phase": "playing",
        "current": 0,
        "nodes": [{
            "id": 0,
            "move": null,
            "board": board,
            "next_player": 1,
            "parent": null,
            "children": []
        }]
    })
    .to_string()
}
