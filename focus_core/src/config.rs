//! Configuration file support for the focus timer.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/focus/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub timer: TimerSettings,

    #[serde(default)]
    pub sound: SoundConfig,

    #[serde(default)]
    pub challenge: ChallengeConfig,

    #[serde(default)]
    pub history: HistoryConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Tick scheduling and completion timing
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimerSettings {
    /// Pause between a zero-crossing and the next phase becoming active
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// A gap between ticks longer than this is treated as a host suspension
    #[serde(default = "default_suspend_gap_ms")]
    pub suspend_gap_ms: u64,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            suspend_gap_ms: default_suspend_gap_ms(),
        }
    }
}

/// Sound cues handed to the sound collaborator
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SoundConfig {
    /// Ambient track started whenever a session is running
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambient: Option<String>,

    #[serde(default = "default_completion_sound")]
    pub completion: String,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            ambient: None,
            completion: default_completion_sound(),
        }
    }
}

/// Daily challenge parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChallengeConfig {
    /// Sessions finished before this local hour count for the morning challenge
    #[serde(default = "default_morning_cutoff_hour")]
    pub morning_cutoff_hour: u32,

    #[serde(default = "default_pomodoro_min_secs")]
    pub pomodoro_min_secs: u64,

    #[serde(default = "default_pomodoro_max_secs")]
    pub pomodoro_max_secs: u64,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            morning_cutoff_hour: default_morning_cutoff_hour(),
            pomodoro_min_secs: default_pomodoro_min_secs(),
            pomodoro_max_secs: default_pomodoro_max_secs(),
        }
    }
}

/// Session history configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Records kept in the session log
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            recent_limit: default_recent_limit(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|_| PathBuf::from("."))
    });
    base.join("focus")
}

fn default_settle_delay_ms() -> u64 {
    1000
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_suspend_gap_ms() -> u64 {
    2500
}

fn default_completion_sound() -> String {
    "bell".into()
}

fn default_morning_cutoff_hour() -> u32 {
    10
}

fn default_pomodoro_min_secs() -> u64 {
    24 * 60
}

fn default_pomodoro_max_secs() -> u64 {
    26 * 60
}

fn default_recent_limit() -> usize {
    10
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject settings the engine cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.timer.tick_interval_ms == 0 {
            return Err(Error::Config("timer.tick_interval_ms must be positive".into()));
        }
        if self.challenge.morning_cutoff_hour > 24 {
            return Err(Error::Config(format!(
                "challenge.morning_cutoff_hour out of range: {}",
                self.challenge.morning_cutoff_hour
            )));
        }
        if self.challenge.pomodoro_min_secs > self.challenge.pomodoro_max_secs {
            return Err(Error::Config(
                "challenge.pomodoro_min_secs exceeds pomodoro_max_secs".into(),
            ));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|_| PathBuf::from("."))
        });
        base.join("focus").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
