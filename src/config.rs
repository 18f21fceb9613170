//! Client configuration.

use crate::othello::Player;
use crate::service::Difficulty;
use crate::session::{GameMode, GameSettings};
use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Environment variable overriding the move service URL.
pub const SERVICE_URL_ENV: &str = "STRICTLY_OTHELLO_SERVICE_URL";

/// Environment variable overriding the save database path.
pub const DATABASE_ENV: &str = "STRICTLY_OTHELLO_DB";

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "strictly_othello.toml";

/// Client configuration, usually loaded from TOML.
///
/// ```toml
/// service_url = "http://127.0.0.1:8000"
/// database_path = "strictly_othello.db"
/// mode = "human-vs-ai"
/// human_side = "white"
/// difficulty = "hard"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
pub struct ClientConfig {
    /// Base URL of the move service.
    #[serde(default = "default_service_url")]
    service_url: String,

    /// SQLite file holding the autosave slot and named saves.
    #[serde(default = "default_database_path")]
    database_path: PathBuf,

    /// Quiet period before an autosave is written.
    #[serde(default = "default_autosave_debounce_ms")]
    autosave_debounce_ms: u64,

    /// Default game mode.
    #[serde(default)]
    mode: GameMode,

    /// Default human side in human-vs-ai mode.
    #[serde(default = "default_human_side", with = "player_name")]
    human_side: Player,

    /// Default AI difficulty.
    #[serde(default)]
    difficulty: Difficulty,
}

#[instrument]
fn default_service_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

#[instrument]
fn default_database_path() -> PathBuf {
    PathBuf::from("strictly_othello.db")
}

#[instrument]
fn default_autosave_debounce_ms() -> u64 {
    500
}

#[instrument]
fn default_human_side() -> Player {
    Player::Black
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            database_path: default_database_path(),
            autosave_debounce_ms: default_autosave_debounce_ms(),
            mode: GameMode::default(),
            human_side: default_human_side(),
            difficulty: Difficulty::default(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(service_url = %config.service_url, "Config loaded successfully");
        Ok(config)
    }

    /// Resolves the effective configuration.
    ///
    /// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_FILE`] is
    /// read when present and defaults are used otherwise. Environment
    /// overrides apply last.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a config file cannot be read or parsed.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE)?,
            None => {
                debug!("No config file, using defaults");
                Self::default()
            }
        };
        Ok(config.with_env_overrides())
    }

    /// Applies [`SERVICE_URL_ENV`] and [`DATABASE_ENV`] when set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(SERVICE_URL_ENV) {
            debug!(url = %url, "Service URL overridden from environment");
            self.service_url = url;
        }
        if let Ok(path) = std::env::var(DATABASE_ENV) {
            debug!(path = %path, "Database path overridden from environment");
            self.database_path = PathBuf::from(path);
        }
        self
    }

    /// Autosave debounce as a duration.
    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    /// Game settings built from the configured defaults.
    pub fn game_settings(&self) -> GameSettings {
        GameSettings {
            mode: self.mode,
            human_side: self.human_side,
            difficulty: self.difficulty,
        }
    }
}

/// Reads and writes players by name ("black"/"white") rather than wire code.
mod player_name {
    use crate::othello::Player;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(player: &Player, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&player.to_string().to_lowercase())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Player, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse()
            .map_err(|_| serde::de::Error::custom(format!("unknown side '{name}', expected black or white")))
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
