//! Strictly Othello - client-side Othello sessions with a branching move tree
//!
//! All game rules live in a remote move service. This library keeps the
//! session state around it: whose turn it is, the tree of every explored
//! position, undo and jumping between variations, and persistence.
//!
//! # Architecture
//!
//! - **Othello**: board, squares, players and moves as plain values
//! - **Service**: the [`MoveService`] seam and its HTTP client
//! - **Tree**: the [`PositionTree`] of explored positions
//! - **Session**: the [`SessionController`] state machine
//! - **Persist**: snapshots, analysis files, linear records and autosave
//! - **Db**: the SQLite [`SaveStore`]
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use strictly_othello::{GameSettings, HttpMoveService, SessionController};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let service = Arc::new(HttpMoveService::new("http://127.0.0.1:8000"));
//! let (mut session, _replies) = SessionController::new(service);
//! session.start_game(GameSettings::default()).await?;
//! session.click("d3".parse()?).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod db;
mod othello;
mod persist;
mod service;
mod session;
mod tree;

// Crate-level exports - Configuration
pub use config::{ClientConfig, ConfigError, DATABASE_ENV, DEFAULT_CONFIG_FILE, SERVICE_URL_ENV};

// Crate-level exports - Domain types
pub use othello::{BOARD_SIZE, Board, Cell, GameResult, Move, Player, Score, Square, SquareParseError};

// Crate-level exports - Move service
pub use service::{
    AiMoveOutcome, Difficulty, HttpMoveService, MoveOutcome, MoveService, ServiceError,
    ServiceErrorKind,
};

// Crate-level exports - Move tree
pub use tree::{Node, NodeId, PositionTree, TreeError};

// Crate-level exports - Session
pub use session::{
    GameMode, GameSettings, OpponentReplies, OpponentReply, Phase, SessionController, SessionError,
    SessionView, Ticket,
};

// Crate-level exports - Persistence
pub use db::{SaveEntry, SaveStore, StorageError};
pub use persist::{
    AutoSaver, FORMAT_TAG, ImportError, LinearRecord, LoadedGame, SCHEMA_VERSION, Snapshot,
};
