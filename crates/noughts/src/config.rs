//! Engine configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// How `redo` sets the status of the game it lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedoStatus {
    /// Always mark the game incomplete, even when the redone snapshot holds
    /// a win or a full board. The winner is still recomputed.
    #[default]
    AlwaysIncomplete,
    /// Derive the status from the redone snapshot like every other move.
    Recompute,
}

/// Tunables for the engine.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_", strip_option)]
pub struct EngineConfig {
    /// Delay before the opponent's reply is played, in milliseconds.
    #[serde(default = "default_opponent_delay_ms")]
    opponent_delay_ms: u64,

    /// Elapsed-time tick for the viewed game, in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    tick_interval_ms: u64,

    /// Status handling on redo.
    #[serde(default)]
    redo_status: RedoStatus,

    /// Fixed seed for the opponent's random corner/side picks.
    #[serde(default)]
    seed: Option<u64>,
}

fn default_opponent_delay_ms() -> u64 {
    500
}

fn default_tick_interval_ms() -> u64 {
    1000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            opponent_delay_ms: default_opponent_delay_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            redo_status: RedoStatus::default(),
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Loads configuration from a TOML file. Missing keys take defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(?config, "Config loaded successfully");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))
    }

    /// Opponent delay as a [`Duration`].
    pub fn opponent_delay(&self) -> Duration {
        Duration::from_millis(self.opponent_delay_ms)
    }

    /// Tick interval as a [`Duration`]. Never zero.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
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
