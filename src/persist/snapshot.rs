//! Versioned session snapshots and analysis-file import.

use crate::othello::GameResult;
use crate::session::{GameSettings, Phase};
use crate::tree::{Node, NodeId, PositionTree};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// Schema version written by this build.
pub const SCHEMA_VERSION: u32 = 1;

/// Marker identifying analysis files.
pub const FORMAT_TAG: &str = "strictly-othello-analysis";

/// Why an analysis file was refused.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ImportError {
    /// Not valid JSON, wrong shape, or structurally inconsistent.
    #[display("Invalid analysis file: {}", _0)]
    Malformed(String),
    /// Written by a schema version this build does not read.
    #[display("Unsupported analysis file version {} (supported: {})", found, supported)]
    UnsupportedVersion {
        /// Version found in the file.
        found: u64,
        /// Version this build reads.
        supported: u32,
    },
}

impl std::error::Error for ImportError {}

/// Complete serializable record of a session: the whole tree, the position
/// pointer and the settings. Used for analysis files and for saves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Always [`FORMAT_TAG`].
    pub format: String,
    /// Always [`SCHEMA_VERSION`] when written by this build.
    pub version: u32,
    /// When the snapshot was taken.
    pub saved_at: DateTime<Utc>,
    /// Settings of the session.
    pub settings: GameSettings,
    /// Phase at capture time. Informational; recomputed on load.
    pub phase: Phase,
    /// Result at capture time. Informational; recomputed on load.
    #[serde(default)]
    pub result: Option<GameResult>,
    /// Current position; the root when absent.
    #[serde(default)]
    pub current: Option<NodeId>,
    /// Every node of the tree.
    pub nodes: Vec<Node>,
}

impl Snapshot {
    /// Captures the given session state.
    #[instrument(skip(tree, result), fields(nodes = tree.len()))]
    pub fn capture(
        tree: &PositionTree,
        current: NodeId,
        settings: GameSettings,
        phase: Phase,
        result: Option<GameResult>,
    ) -> Self {
        Self {
            format: FORMAT_TAG.to_string(),
            version: SCHEMA_VERSION,
            saved_at: Utc::now(),
            settings,
            phase,
            result,
            current: Some(current),
            nodes: tree.nodes().cloned().collect(),
        }
    }

    /// Serializes to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error; not expected for well-formed snapshots.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Plies from the root to the current position, following parent links.
    pub fn plies_to_current(&self) -> usize {
        let parents: HashMap<NodeId, Option<NodeId>> =
            self.nodes.iter().map(|n| (n.id(), n.parent())).collect();
        let mut cursor = self.current.unwrap_or(NodeId::ROOT);
        let mut plies = 0;
        while let Some(Some(parent)) = parents.get(&cursor) {
            plies += 1;
            cursor = *parent;
            if plies > self.nodes.len() {
                break;
            }
        }
        plies
    }

    /// Parses and fully validates an analysis file.
    ///
    /// Nothing is applied anywhere: the result is a [`LoadedGame`] that a
    /// session can adopt in one step.
    ///
    /// # Errors
    ///
    /// [`ImportError::UnsupportedVersion`] for unknown schema versions,
    /// [`ImportError::Malformed`] for everything else.
    #[instrument(skip(text), fields(bytes = text.len()))]
    pub fn parse(text: &str) -> Result<LoadedGame, ImportError> {
        let value: serde_json::Value = serde_json::from_str(text).map_err(|e| {
            warn!(error = %e, "Analysis file is not JSON");
            ImportError::Malformed(format!("not JSON: {e}"))
        })?;

        let version = value
            .get("version")
            .ok_or_else(|| ImportError::Malformed("missing schema version".to_string()))?
            .as_u64()
            .ok_or_else(|| ImportError::Malformed("invalid schema version".to_string()))?;
        if version != u64::from(SCHEMA_VERSION) {
            warn!(version, "Unsupported analysis file version");
            return Err(ImportError::UnsupportedVersion {
                found: version,
                supported: SCHEMA_VERSION,
            });
        }
        if value.get("format").and_then(serde_json::Value::as_str) != Some(FORMAT_TAG) {
            return Err(ImportError::Malformed(
                "not a strictly-othello analysis file".to_string(),
            ));
        }

        let snapshot: Snapshot = serde_json::from_value(value)
            .map_err(|e| ImportError::Malformed(e.to_string()))?;
        snapshot.into_game()
    }

    /// Rebuilds the tree and checks the position pointer.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Malformed`] when the node table is inconsistent
    /// or the current position is not in it.
    pub fn into_game(self) -> Result<LoadedGame, ImportError> {
        let tree =
            PositionTree::from_nodes(self.nodes).map_err(|e| ImportError::Malformed(e.to_string()))?;
        let current = self.current.unwrap_or(NodeId::ROOT);
        if !tree.contains(current) {
            return Err(ImportError::Malformed(format!(
                "current position {current} is not in the tree"
            )));
        }
        info!(nodes = tree.len(), current = %current, "Analysis file validated");
        Ok(LoadedGame {
            tree,
            current,
            settings: self.settings,
            saved_at: self.saved_at,
        })
    }
}

/// A validated snapshot, ready to be adopted by a session.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct LoadedGame {
    /// The rebuilt tree.
    pub(crate) tree: PositionTree,
    /// Position the session will resume at.
    #[getter(copy)]
    pub(crate) current: NodeId,
    /// Settings stored with the game.
    pub(crate) settings: GameSettings,
    /// When the snapshot was taken.
    #[getter(copy)]
    pub(crate) saved_at: DateTime<Utc>,
}
