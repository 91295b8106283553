use serde::Deserialize;
use std::time::Duration;

use crate::media::errors::ConfigError;

// --- Session Loop Constants ---
pub const SESSION_TICK_INTERVAL_MS: u64 = 250; // housekeeping only, engine drives time updates
pub const COMMAND_CHANNEL_SIZE: usize = 32;
pub const SESSION_EVENT_CHANNEL_SIZE: usize = 64;

// --- Playback Constants ---
pub const DEFAULT_VOLUME_LEVEL: f32 = 1.0;
/// Upper bound on the await-and-ignore suspension before a pending play
/// operation is abandoned.
pub const DEFAULT_PLAY_SETTLE_TIMEOUT_MS: u64 = 10_000;

// --- Error Classification ---
pub const HTTP_TOO_MANY_REQUESTS: u16 = 429;
pub const TOO_MANY_REQUESTS_REASON: &str = "too many requests";

// --- Catalog ---
pub const PLACEHOLDER_POSTER_PATH: &str = "/images/placeholder.jpg";

/// Per-session tuning. Every key is optional in TOML.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Load source 0 as part of `initialize`.
    pub autoload_first_source: bool,
    pub initial_volume: f32,
    pub initial_muted: bool,
    pub tick_interval_ms: u64,
    pub play_settle_timeout_ms: Option<u64>,
    /// Move a session stuck in Loading/Buffering to Errored after this long.
    /// Off by default.
    pub stall_timeout_ms: Option<u64>,
    pub command_channel_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            autoload_first_source: false,
            initial_volume: DEFAULT_VOLUME_LEVEL,
            initial_muted: false,
            tick_interval_ms: SESSION_TICK_INTERVAL_MS,
            play_settle_timeout_ms: Some(DEFAULT_PLAY_SETTLE_TIMEOUT_MS),
            stall_timeout_ms: None,
            command_channel_size: COMMAND_CHANNEL_SIZE,
        }
    }
}

impl SessionConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initial_volume.is_finite() || !(0.0..=1.0).contains(&self.initial_volume) {
            return Err(ConfigError::InvalidValue {
                key: "initial_volume",
                reason: format!("{} is outside [0, 1]", self.initial_volume),
            });
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "tick_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.command_channel_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "command_channel_size",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.stall_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "stall_timeout_ms",
                reason: "use no value to disable, not zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn play_settle_timeout(&self) -> Option<Duration> {
        self.play_settle_timeout_ms.map(Duration::from_millis)
    }

    pub fn stall_timeout(&self) -> Option<Duration> {
        self.stall_timeout_ms.map(Duration::from_millis)
    }
}
