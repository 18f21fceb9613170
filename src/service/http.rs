//! HTTP implementation of the move service.

use super::{AiMoveOutcome, Difficulty, MoveOutcome, MoveService, ServiceError};
use crate::othello::{Board, Player, Square};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Body of `POST /move`.
#[derive(Debug, Serialize)]
struct MoveRequest<'a> {
    board: &'a Board,
    player: Player,
    row: u8,
    col: u8,
}

/// Body of `POST /ai-move`.
#[derive(Debug, Serialize)]
struct AiMoveRequest<'a> {
    board: &'a Board,
    player: Player,
    difficulty: Difficulty,
}

/// Body of `POST /valid-moves`.
#[derive(Debug, Serialize)]
struct ValidMovesRequest<'a> {
    board: &'a Board,
    player: Player,
}

/// Position returned by `/move` and `/ai-move`.
///
/// `next_player` and `winner` arrive as raw codes: the service sends `0` or
/// `null` for "nobody" (game over, draw).
#[derive(Debug, Deserialize)]
struct MoveResponse {
    board: Board,
    #[serde(default)]
    next_player: Option<u8>,
    #[serde(default)]
    valid_moves: Vec<Square>,
    #[serde(default)]
    flipped: Vec<Square>,
    #[serde(default)]
    game_over: bool,
    #[serde(default)]
    winner: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct AiMoveResponse {
    #[serde(flatten)]
    position: MoveResponse,
    #[serde(rename = "move", default)]
    chosen: Option<Square>,
}

#[derive(Debug, Deserialize)]
struct ValidMovesResponse {
    valid_moves: Vec<Square>,
}

impl MoveResponse {
    fn into_outcome(self) -> Result<MoveOutcome, ServiceError> {
        let next_player = match (self.game_over, self.next_player) {
            (true, _) | (false, None) | (false, Some(0)) => None,
            (false, Some(code)) => Some(Player::try_from(code).map_err(ServiceError::unreachable)?),
        };
        if !self.game_over && next_player.is_none() {
            return Err(ServiceError::unreachable(
                "Response has no next player for an unfinished game",
            ));
        }
        let winner = match self.winner {
            None | Some(0) => None,
            Some(code) => Some(Player::try_from(code).map_err(ServiceError::unreachable)?),
        };
        Ok(MoveOutcome {
            board: self.board,
            next_player,
            legal_moves: if self.game_over {
                Vec::new()
            } else {
                self.valid_moves
            },
            flipped: self.flipped,
            game_over: self.game_over,
            winner,
        })
    }
}

/// Move service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpMoveService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpMoveService {
    /// Creates a client for the service at `base_url` (for example
    /// `http://localhost:8000`).
    #[instrument(skip(base_url), fields(base_url = %base_url.as_ref()))]
    pub fn new(base_url: impl AsRef<str>) -> Self {
        let base_url = base_url.as_ref().trim_end_matches('/').to_string();
        info!(base_url = %base_url, "Creating move service client");
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Returns the service base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Posts `body` to `path` and decodes the JSON answer.
    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ServiceError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Posting to move service");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ServiceError::unreachable(format!("Request to {url} failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ServiceError::unreachable(format!("Failed to read response: {e}")))?;
        debug!(status = %status, body_length = text.len(), "Got move service response");

        if !status.is_success() {
            let reason = rejection_reason(&text).unwrap_or_else(|| format!("HTTP {status}"));
            warn!(status = %status, reason = %reason, "Move service rejected request");
            return Err(ServiceError::rejected(reason));
        }

        serde_json::from_str(&text)
            .map_err(|e| ServiceError::unreachable(format!("Invalid response from {url}: {e}")))
    }
}

/// Extracts a human-readable reason from an error body.
fn rejection_reason(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    ["detail", "error", "message"].iter().find_map(|key| match json.get(*key)? {
        serde_json::Value::String(reason) => Some(reason.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    })
}

#[async_trait::async_trait]
impl MoveService for HttpMoveService {
    #[instrument(skip(self, board), fields(player = %player, square = %square))]
    async fn apply_human_move(
        &self,
        board: &Board,
        player: Player,
        square: Square,
    ) -> Result<MoveOutcome, ServiceError> {
        let request = MoveRequest {
            board,
            player,
            row: square.row(),
            col: square.col(),
        };
        let response: MoveResponse = self.post("/move", &request).await?;
        let outcome = response.into_outcome()?;
        info!(
            next_player = ?outcome.next_player,
            flipped = outcome.flipped.len(),
            game_over = outcome.game_over,
            "Human move applied"
        );
        Ok(outcome)
    }

    #[instrument(skip(self, board), fields(player = %player, difficulty = %difficulty))]
    async fn apply_ai_move(
        &self,
        board: &Board,
        player: Player,
        difficulty: Difficulty,
    ) -> Result<AiMoveOutcome, ServiceError> {
        let request = AiMoveRequest {
            board,
            player,
            difficulty,
        };
        let response: AiMoveResponse = self.post("/ai-move", &request).await?;
        let square = response.chosen;
        let outcome = response.position.into_outcome()?;
        info!(
            square = ?square,
            next_player = ?outcome.next_player,
            game_over = outcome.game_over,
            "AI move applied"
        );
        Ok(AiMoveOutcome { square, outcome })
    }

    #[instrument(skip(self, board), fields(player = %player))]
    async fn query_legal_moves(
        &self,
        board: &Board,
        player: Player,
    ) -> Result<Vec<Square>, ServiceError> {
        let request = ValidMovesRequest { board, player };
        let response: ValidMovesResponse = self.post("/valid-moves", &request).await?;
        debug!(count = response.valid_moves.len(), "Legal moves received");
        Ok(response.valid_moves)
    }
}
