//! Configuration loading and validation for the leaderwatch daemon.

use leaderwatch::TriggerSchedule;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use validator::{Validate, ValidationError};

// Re-export Validate trait for derive macro
#[allow(unused_imports)]
use validator::Validate as _;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URLs of the leader-data API nodes, tried in rotation. With no
    /// entries the leader watcher is disabled.
    #[serde(default)]
    pub apis: Vec<String>,

    #[serde(default)]
    pub watcher: WatcherSettings,

    #[serde(default)]
    pub endpoints: EndpointSettings,

    #[serde(default)]
    pub telegram: TelegramSettings,

    /// Path of the persisted snapshot blob.
    #[serde(default = "default_state_file")]
    pub state_file: String,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Validate for Config {
    fn validate(&self) -> Result<(), validator::ValidationErrors> {
        self.watcher.validate()?;
        self.endpoints.validate()?;
        Ok(())
    }
}

/// Leader watcher settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WatcherSettings {
    /// Interval between leader polls.
    #[serde(with = "humantime_serde")]
    #[validate(custom = "validate_poll_interval")]
    pub interval: Duration,

    /// Fetch retries per cycle before giving up until the next tick.
    #[validate(range(max = 20))]
    pub retries: u32,

    /// Fixed delay between fetch retries.
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,

    /// Escalation schedule for ongoing miss streaks (block counts).
    #[validate(custom = "validate_schedule")]
    pub triggers: TriggerSchedule,
}

/// Endpoint availability watcher settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EndpointSettings {
    /// Interval between liveness probe rounds.
    #[serde(with = "humantime_serde")]
    #[validate(custom = "validate_poll_interval")]
    pub interval: Duration,

    /// Per-request probe timeout; a slow node counts as down.
    #[serde(with = "humantime_serde")]
    #[validate(custom = "validate_probe_timeout")]
    pub probe_timeout: Duration,

    /// Base URLs of the nodes to probe. With no entries the endpoint
    /// watcher is disabled.
    #[serde(default)]
    pub nodes: Vec<String>,

    /// Escalation schedule for ongoing downtime (seconds).
    #[validate(custom = "validate_schedule")]
    pub triggers: TriggerSchedule,
}

/// Telegram delivery settings; with no token or chat id, alerts are logged
/// instead of sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramSettings {
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,

    #[serde(default)]
    pub token: String,

    #[serde(default)]
    pub chat_id: Option<i64>,
}

impl TelegramSettings {
    pub fn is_configured(&self) -> bool {
        !self.token.is_empty() && self.chat_id.is_some()
    }
}

/// Logging settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: Option<String>,
    pub format: Option<String>,
}

fn default_state_file() -> String {
    "./leaderwatch-state.json".to_string()
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org/bot".to_string()
}

// Default implementations

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            retries: 3,
            retry_delay: Duration::from_secs(30),
            triggers: TriggerSchedule::new(10, vec![1, 3, 5]),
        }
    }
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            probe_timeout: Duration::from_secs(10),
            nodes: Vec::new(),
            triggers: TriggerSchedule::new(3600, vec![300, 900]),
        }
    }
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            api_url: default_telegram_api_url(),
            token: String::new(),
            chat_id: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            apis: Vec::new(),
            watcher: WatcherSettings::default(),
            endpoints: EndpointSettings::default(),
            telegram: TelegramSettings::default(),
            state_file: default_state_file(),
            logging: LoggingSettings::default(),
        }
    }
}

// Custom validators

fn validate_poll_interval(interval: &Duration) -> Result<(), ValidationError> {
    let secs = interval.as_secs();
    if secs < 1 || secs > 86_400 {
        return Err(ValidationError::new("poll_interval_out_of_range"));
    }
    Ok(())
}

fn validate_probe_timeout(timeout: &Duration) -> Result<(), ValidationError> {
    let millis = timeout.as_millis();
    if millis < 100 || millis > 120_000 {
        return Err(ValidationError::new("probe_timeout_out_of_range"));
    }
    Ok(())
}

fn validate_schedule(schedule: &TriggerSchedule) -> Result<(), ValidationError> {
    if schedule.repeater == 0 {
        return Err(ValidationError::new("repeater_must_be_positive"));
    }
    if schedule.checkpoints.iter().any(|&t| t == 0) {
        return Err(ValidationError::new("checkpoints_must_be_positive"));
    }
    Ok(())
}

// Configuration loading implementation

impl Config {
    /// Load configuration from default search paths
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => {
                tracing::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(&path)
            }
            None => {
                tracing::info!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut paths = vec![PathBuf::from("/etc/leaderwatch/leaderwatch.yaml")];

        if let Some(home_path) = Self::home_config_path() {
            paths.push(home_path);
        }

        paths.push(PathBuf::from("./leaderwatch.yaml"));

        paths
            .into_iter()
            .find(|p: &PathBuf| p.exists() && p.is_file())
    }

    /// Get home directory config path
    fn home_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config/leaderwatch/leaderwatch.yaml"))
    }
}
