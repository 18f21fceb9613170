//! Session state machine.

use super::pending::{OpponentReplies, OpponentReply, RequestSlot};
use super::{GameSettings, Phase, SessionError, SessionView};
use crate::othello::{Board, GameResult, Move, Square};
use crate::persist::{AutoSaver, LinearRecord, LoadedGame, Snapshot};
use crate::service::{MoveOutcome, MoveService, ServiceError};
use crate::tree::{Node, NodeId, PositionTree};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Instrument, debug, info, info_span, instrument, warn};

/// Drives one game session: human input, opponent requests, navigation
/// through the move tree, and persistence.
///
/// All rules come from the [`MoveService`]. The controller never computes
/// legality itself; it caches what the service reports on each node.
///
/// Opponent moves are requested on a background task. Their results arrive on
/// the [`OpponentReplies`] channel returned by [`SessionController::new`] and
/// must be handed back through [`SessionController::on_opponent_reply`].
pub struct SessionController<S: MoveService> {
    service: Arc<S>,
    settings: GameSettings,
    phase: Phase,
    tree: PositionTree,
    current: NodeId,
    legal: Vec<Square>,
    result: Option<GameResult>,
    requests: RequestSlot,
    replies: mpsc::UnboundedSender<OpponentReply>,
    autosave: Option<AutoSaver>,
}

impl<S: MoveService> SessionController<S> {
    /// Creates a session in [`Phase::Setup`] and the channel its opponent
    /// replies are delivered on.
    pub fn new(service: Arc<S>) -> (Self, OpponentReplies) {
        let (replies, receiver) = mpsc::unbounded_channel();
        let controller = Self {
            service,
            settings: GameSettings::default(),
            phase: Phase::Setup,
            tree: PositionTree::new(),
            current: NodeId::ROOT,
            legal: Vec::new(),
            result: None,
            requests: RequestSlot::default(),
            replies,
            autosave: None,
        };
        (controller, receiver)
    }

    /// Attaches a background autosaver. Every state change schedules a write.
    pub fn with_autosave(mut self, saver: AutoSaver) -> Self {
        self.autosave = Some(saver);
        self
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Settings of the current game.
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// The move tree.
    pub fn tree(&self) -> &PositionTree {
        &self.tree
    }

    /// Handle of the current position.
    pub fn current(&self) -> NodeId {
        self.current
    }

    /// Legal destinations at the current position.
    pub fn legal_moves(&self) -> &[Square] {
        &self.legal
    }

    /// Final result, set only in [`Phase::GameOver`].
    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    /// Returns `true` while an opponent request is outstanding.
    pub fn is_opponent_thinking(&self) -> bool {
        self.requests.is_pending()
    }

    /// Returns `true` when the side to move at the current position is the AI.
    pub fn is_opponent_turn(&self) -> bool {
        self.current_node()
            .and_then(Node::next_player)
            .is_some_and(|player| self.settings.is_opponent(player))
    }

    /// Returns `true` when play stalled after navigation: the opponent is to
    /// move with no request outstanding, or the side to move must pass.
    pub fn awaiting_resume(&self) -> bool {
        self.phase == Phase::Playing
            && !self.requests.is_pending()
            && (self.is_opponent_turn() || self.legal.is_empty())
    }

    fn current_node(&self) -> Option<&Node> {
        self.tree.get(self.current).ok()
    }

    /// Starts a fresh game, discarding the current tree.
    ///
    /// The initial legal moves are fetched before anything changes, so a
    /// service failure leaves the session untouched. In human-vs-ai mode with
    /// the human on white the opponent's first move is requested right away.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Service`] if the service cannot be reached.
    #[instrument(skip(self), fields(mode = %settings.mode, human = %settings.human_side, difficulty = %settings.difficulty))]
    pub async fn start_game(&mut self, settings: GameSettings) -> Result<(), SessionError> {
        let board = Board::initial();
        let legal = self
            .service
            .query_legal_moves(&board, crate::othello::Player::Black)
            .await?;

        self.requests.cancel();
        let mut tree = PositionTree::new();
        tree.create_root(board, Some(legal));
        self.tree = tree;
        self.settings = settings;
        self.enter(NodeId::ROOT).await?;
        info!("Game started");

        self.settle().await?;
        self.persist();
        Ok(())
    }

    /// Returns to [`Phase::Setup`], dropping the tree and any opponent request.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        self.requests.cancel();
        self.tree = PositionTree::new();
        self.current = NodeId::ROOT;
        self.legal.clear();
        self.result = None;
        self.phase = Phase::Setup;
        info!("Session reset");
    }

    /// Plays `square` for the human side to move.
    ///
    /// Returns `Ok(false)` without doing anything when the click is not
    /// applicable: no game in play, the opponent is to move, or the square is
    /// not a legal destination. A move already explored from this position is
    /// replayed from the tree without contacting the service.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Service`] if the move is refused or the service
    /// cannot be reached; nothing changes then. Once the move is applied,
    /// failures while checking for a forced pass are only logged and
    /// [`SessionController::awaiting_resume`] reports the stalled position.
    #[instrument(skip(self), fields(square = %square, node = %self.current))]
    pub async fn click(&mut self, square: Square) -> Result<bool, SessionError> {
        if self.phase != Phase::Playing {
            debug!(phase = %self.phase, "Click ignored outside play");
            return Ok(false);
        }
        let node = self.tree.get(self.current)?;
        let Some(player) = node.next_player() else {
            return Ok(false);
        };
        if self.settings.is_opponent(player) {
            debug!("Click ignored on the opponent's turn");
            return Ok(false);
        }
        if !self.legal.contains(&square) {
            debug!("Click ignored on an illegal square");
            return Ok(false);
        }

        let mv = Move::place(player, square);
        match self.tree.find_existing_child(self.current, &mv) {
            Some(existing) => {
                info!(child = %existing, "Replaying explored move");
                self.navigate(existing).await?;
            }
            None => {
                let board = node.board().clone();
                let outcome = self.service.apply_human_move(&board, player, square).await?;
                self.requests.cancel();
                self.record(self.current, mv, outcome).await?;
            }
        }

        self.settle_after_move().await;
        self.persist();
        Ok(true)
    }

    /// Applies a delivered opponent reply.
    ///
    /// Replies to cancelled or superseded requests are dropped silently and
    /// return `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Service`] when the opponent request failed. The
    /// position is unchanged and [`SessionController::resume`] retries.
    #[instrument(skip(self, reply), fields(ticket = reply.ticket().raw(), origin = %reply.origin()))]
    pub async fn on_opponent_reply(&mut self, reply: OpponentReply) -> Result<bool, SessionError> {
        if !self.requests.redeem(&reply) {
            debug!("Discarding stale opponent reply");
            return Ok(false);
        }
        let OpponentReply { origin, result, .. } = reply;
        if origin != self.current || self.phase != Phase::Playing {
            warn!(current = %self.current, "Opponent reply for a position no longer shown");
            return Ok(false);
        }

        let ai = result?;
        let Some(player) = self.tree.get(origin)?.next_player() else {
            warn!("Opponent reply for a terminal position");
            return Ok(false);
        };
        let mv = match ai.square {
            Some(square) => Move::place(player, square),
            None => Move::pass(player),
        };
        info!(mv = %mv, "Opponent moved");
        self.record(origin, mv, ai.outcome).await?;

        self.settle_after_move().await;
        self.persist();
        Ok(true)
    }

    /// Steps back to the previous position where the human has a decision.
    ///
    /// Forced-pass positions are skipped, and in human-vs-ai mode so are
    /// positions where the opponent is to move. Any outstanding opponent
    /// request is cancelled. No opponent move is requested afterwards.
    ///
    /// Returns `Ok(false)` at the root or before a game has started.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Service`] if legal moves for the target must be
    /// fetched and the service fails; the session is unchanged then.
    #[instrument(skip(self), fields(node = %self.current))]
    pub async fn undo(&mut self) -> Result<bool, SessionError> {
        if self.phase == Phase::Setup {
            return Ok(false);
        }
        let Some(mut target) = self.tree.get(self.current)?.parent() else {
            debug!("Already at the root");
            return Ok(false);
        };
        loop {
            let node = self.tree.get(target)?;
            if node.is_root() || self.is_decision_point(node) {
                break;
            }
            match node.parent() {
                Some(parent) => target = parent,
                None => break,
            }
        }

        self.navigate(target).await?;
        info!(target = %target, "Undo");
        self.persist();
        Ok(true)
    }

    /// Moves the pointer to any known position without changing the tree.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoGame`] before a game starts, [`SessionError::Tree`]
    /// for unknown handles, and [`SessionError::Service`] when legal moves
    /// must be fetched and the service fails. The session is unchanged on error.
    #[instrument(skip(self), fields(from = %self.current))]
    pub async fn jump_to(&mut self, target: NodeId) -> Result<(), SessionError> {
        if self.phase == Phase::Setup {
            return Err(SessionError::NoGame);
        }
        self.navigate(target).await?;
        info!(target = %target, "Jumped");
        self.persist();
        Ok(())
    }

    /// Continues play from the current position: applies a forced pass or
    /// asks the opponent to move, whichever is due.
    ///
    /// Returns `Ok(true)` when something was done.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Service`] if the pass check fails.
    #[instrument(skip(self), fields(node = %self.current))]
    pub async fn resume(&mut self) -> Result<bool, SessionError> {
        if self.phase != Phase::Playing || self.requests.is_pending() {
            return Ok(false);
        }
        let before = self.current;
        self.settle().await?;
        let acted = self.current != before || self.requests.is_pending() || self.phase != Phase::Playing;
        if acted {
            self.persist();
        }
        Ok(acted)
    }

    /// Cancels the outstanding opponent request, if any.
    #[instrument(skip(self))]
    pub fn cancel_opponent(&mut self) -> bool {
        self.requests.cancel()
    }

    /// Captures the session for saving or export. `None` before a game starts.
    pub fn snapshot(&self) -> Option<Snapshot> {
        if self.phase == Phase::Setup {
            return None;
        }
        Some(Snapshot::capture(
            &self.tree,
            self.current,
            self.settings,
            self.phase,
            self.result,
        ))
    }

    /// The main line as a linear record. `None` before a game starts.
    pub fn linear_record(&self) -> Option<LinearRecord> {
        if self.phase == Phase::Setup {
            return None;
        }
        Some(LinearRecord::from_tree(&self.tree, self.settings))
    }

    /// Adopts a validated game, replacing the session in one step.
    ///
    /// Phase and result are derived from the restored position. Opponent moves
    /// and passes wait for [`SessionController::resume`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Service`] when legal moves at the restored
    /// position are unknown and cannot be fetched; the session is unchanged.
    #[instrument(skip(self, game), fields(nodes = game.tree.len(), current = %game.current))]
    pub async fn restore(&mut self, game: LoadedGame) -> Result<(), SessionError> {
        let LoadedGame {
            tree,
            current,
            settings,
            saved_at,
        } = game;
        let legal = Self::resolve_legal(self.service.as_ref(), tree.get(current)?).await?;

        self.requests.cancel();
        self.tree = tree;
        self.settings = settings;
        self.commit(current, legal)?;
        info!(saved_at = %saved_at, "Session restored");
        self.persist();
        Ok(())
    }

    /// Restores the autosave slot, if an autosaver is attached and the slot
    /// holds a game. Storage failures are logged and reported as `Ok(false)`.
    ///
    /// # Errors
    ///
    /// [`SessionError::Import`] when the stored payload is invalid and
    /// [`SessionError::Service`] as for [`SessionController::restore`].
    #[instrument(skip(self))]
    pub async fn restore_autosave(&mut self) -> Result<bool, SessionError> {
        let Some(saver) = &self.autosave else {
            return Ok(false);
        };
        let payload = match saver.store().load_autosave() {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                debug!("No autosave to restore");
                return Ok(false);
            }
            Err(e) => {
                warn!(error = %e, "Could not read autosave");
                return Ok(false);
            }
        };
        let game = Snapshot::parse(&payload)?;
        self.restore(game).await?;
        Ok(true)
    }

    /// Waits for a scheduled autosave to be written.
    pub async fn flush_autosave(&mut self) {
        if let Some(saver) = self.autosave.as_mut() {
            saver.flush().await;
        }
    }

    /// Builds the front-end view. `None` before a game starts.
    pub fn view(&self) -> Option<SessionView> {
        if self.phase == Phase::Setup {
            return None;
        }
        let node = self.current_node()?;
        Some(SessionView {
            current: self.current,
            board: node.board().clone(),
            to_move: node.next_player(),
            legal_moves: self.legal.clone(),
            score: node.board().score(),
            phase: self.phase,
            result: self.result,
            last_move: node.mv(),
            flipped: node.flipped().to_vec(),
            moves_played: self.tree.moves_played(self.current).unwrap_or(0),
            opponent_thinking: self.requests.is_pending(),
            awaiting_resume: self.awaiting_resume(),
        })
    }

    /// Variations branching off the position `id`, main line first.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Tree`] for unknown handles.
    pub fn continuations(&self, id: NodeId) -> Result<Vec<(NodeId, Move)>, SessionError> {
        let node = self.tree.get(id)?;
        let mut out = Vec::with_capacity(node.children().len());
        for child in node.children() {
            if let Some(mv) = self.tree.get(*child)?.mv() {
                out.push((*child, mv));
            }
        }
        Ok(out)
    }

    fn is_decision_point(&self, node: &Node) -> bool {
        match node.next_player() {
            Some(player) => !self.settings.is_opponent(player) && !node.is_forced_pass(),
            None => true,
        }
    }

    async fn resolve_legal(service: &S, node: &Node) -> Result<Vec<Square>, ServiceError> {
        match (node.next_player(), node.legal_moves()) {
            (None, _) => Ok(Vec::new()),
            (Some(_), Some(cached)) => Ok(cached.to_vec()),
            (Some(player), None) => {
                debug!(node = %node.id(), "Legal moves unknown, asking the service");
                service.query_legal_moves(node.board(), player).await
            }
        }
    }

    async fn navigate(&mut self, target: NodeId) -> Result<(), SessionError> {
        let legal = Self::resolve_legal(self.service.as_ref(), self.tree.get(target)?).await?;
        self.requests.cancel();
        self.commit(target, legal)
    }

    async fn enter(&mut self, id: NodeId) -> Result<(), SessionError> {
        let legal = Self::resolve_legal(self.service.as_ref(), self.tree.get(id)?).await?;
        self.commit(id, legal)
    }

    fn commit(&mut self, id: NodeId, legal: Vec<Square>) -> Result<(), SessionError> {
        let node = self.tree.get(id)?;
        if node.is_terminal() {
            let result = GameResult::from_board(node.board());
            info!(result = %result.summary(), "Game over");
            self.phase = Phase::GameOver;
            self.result = Some(result);
        } else {
            self.phase = Phase::Playing;
            self.result = None;
        }
        self.current = id;
        self.legal = legal;
        Ok(())
    }

    async fn record(
        &mut self,
        parent: NodeId,
        mv: Move,
        outcome: MoveOutcome,
    ) -> Result<NodeId, SessionError> {
        let id = match self.tree.find_existing_child(parent, &mv) {
            Some(existing) => {
                debug!(child = %existing, "Move already in the tree");
                existing
            }
            None => {
                let next_player = if outcome.game_over {
                    None
                } else {
                    outcome.next_player
                };
                self.tree.add_child(
                    parent,
                    mv,
                    outcome.board,
                    outcome.flipped,
                    next_player,
                    outcome.legal_moves,
                )?
            }
        };
        self.enter(id).await?;
        Ok(id)
    }

    /// Handles forced passes and game end at the current position, then asks
    /// the opponent to move if it is due.
    async fn settle(&mut self) -> Result<(), SessionError> {
        while self.phase == Phase::Playing && self.legal.is_empty() {
            let node = self.tree.get(self.current)?;
            let Some(to_move) = node.next_player() else {
                break;
            };
            let board = node.board().clone();
            let other = to_move.opponent();
            let replies = self.service.query_legal_moves(&board, other).await?;
            if replies.is_empty() {
                info!("Neither side can move");
                self.tree.mark_terminal(self.current)?;
                self.enter(self.current).await?;
                break;
            }

            info!(player = %to_move, "Forced pass");
            let outcome = MoveOutcome {
                board,
                next_player: Some(other),
                legal_moves: replies,
                flipped: Vec::new(),
                game_over: false,
                winner: None,
            };
            self.record(self.current, Move::pass(to_move), outcome)
                .await?;
        }
        self.request_opponent_move();
        Ok(())
    }

    async fn settle_after_move(&mut self) {
        if let Err(e) = self.settle().await {
            warn!(error = %e, node = %self.current, "Move applied but play could not continue");
        }
    }

    fn request_opponent_move(&mut self) {
        if self.phase != Phase::Playing || self.requests.is_pending() {
            return;
        }
        let Some(node) = self.current_node() else {
            return;
        };
        let Some(player) = node.next_player() else {
            return;
        };
        if !self.settings.is_opponent(player) {
            return;
        }

        let board = node.board().clone();
        let origin = self.current;
        let difficulty = self.settings.difficulty;
        let ticket = self.requests.next_ticket();
        let service = Arc::clone(&self.service);
        let replies = self.replies.clone();
        let span = info_span!("opponent_request", ticket = ticket.raw(), origin = %origin);
        let task = tokio::spawn(
            async move {
                let result = service.apply_ai_move(&board, player, difficulty).await;
                if replies.send(OpponentReply::new(ticket, origin, result)).is_err() {
                    debug!("Session closed before the opponent replied");
                }
            }
            .instrument(span),
        );
        self.requests.arm(ticket, origin, task.abort_handle());
        info!(ticket = ticket.raw(), player = %player, "Opponent move requested");
    }

    fn persist(&mut self) {
        let Some(snapshot) = self.snapshot() else {
            return;
        };
        if let Some(saver) = self.autosave.as_mut() {
            saver.schedule(snapshot);
        }
    }
}
