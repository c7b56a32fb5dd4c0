//! Game and server settings
//!
//! Stored as JSON. Every field has a default, so a partial file (or no
//! file at all) is a valid configuration.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::sim::{BoardConfig, Dimensions};

/// Settings for one game instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Pause after every tick (ms)
    pub update_delay_ms: u64,
    /// First side to reach this many points wins
    pub winning_score: u32,
    /// Flat or box-shaped board
    pub dimensions: Dimensions,
    /// Serve RNG seed; random when absent
    pub seed: Option<u64>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            update_delay_ms: DEFAULT_UPDATE_DELAY_MS,
            winning_score: DEFAULT_WINNING_SCORE,
            dimensions: Dimensions::TwoD,
            seed: None,
        }
    }
}

impl GameSettings {
    pub fn new(update_delay: Duration, winning_score: u32) -> Self {
        Self {
            update_delay_ms: update_delay.as_millis().try_into().unwrap_or(u64::MAX),
            winning_score,
            ..Self::default()
        }
    }

    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn update_delay(&self) -> Duration {
        Duration::from_millis(self.update_delay_ms)
    }

    pub fn board_config(&self) -> BoardConfig {
        BoardConfig::for_dimensions(self.dimensions)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.winning_score == 0 {
            return Err(ConfigError::ZeroWinningScore);
        }
        Ok(())
    }
}

/// Settings for the game server binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Interval between report/reap passes (ms)
    pub report_interval_ms: u64,
    /// Games started as soon as the server is up
    pub initial_games: usize,
    /// Stop the server after this many seconds even if games are running
    pub run_for_secs: Option<u64>,
    /// Settings used for every game the server creates
    pub game: GameSettings,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            report_interval_ms: DEFAULT_REPORT_INTERVAL_MS,
            initial_games: 0,
            run_for_secs: None,
            game: GameSettings::default(),
        }
    }
}

impl ServerSettings {
    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }

    pub fn run_for(&self) -> Option<Duration> {
        self.run_for_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.report_interval_ms == 0 {
            return Err(ConfigError::Settings {
                reason: "report_interval_ms must be at least 1".into(),
            });
        }
        self.game.validate()
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json).map_err(|e| ConfigError::Settings {
            reason: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(json) => {
                let settings = Self::from_json(&json)?;
                log::info!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::Settings {
                reason: format!("{}: {e}", path.display()),
            }),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Settings {
            reason: e.to_string(),
        })?;
        fs::write(path, json).map_err(|e| ConfigError::Settings {
            reason: format!("{}: {e}", path.display()),
        })?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
