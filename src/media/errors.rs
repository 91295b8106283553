use thiserror::Error;

use crate::media::playback::commands::SessionCommand;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Engine refused to load source {index} ('{uri}'): {reason}")]
    LoadRejected {
        index: usize,
        uri: String,
        reason: String,
    },
    #[error("Engine command '{command}' failed: {reason}")]
    CommandFailed {
        command: &'static str,
        reason: String,
    },
}

impl EngineError {
    pub fn command_failed(command: &'static str, reason: impl Into<String>) -> Self {
        EngineError::CommandFailed {
            command,
            reason: reason.into(),
        }
    }
}

/// Why an asynchronous play operation settled with a rejection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayRejection {
    #[error("The play() request was interrupted: {0}")]
    Interrupted(String),
    #[error("Playback was not allowed: {0}")]
    NotAllowed(String),
    #[error("Playback failed: {0}")]
    Failed(String),
    #[error("The engine dropped the play operation without settling it")]
    Dropped,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session loop has stopped")]
    SessionClosed,
    #[error("Failed to receive shutdown completion signal: {0}")]
    ShutdownSignalError(String),
    #[error("Tokio MPSC send error for session command: {0}")]
    MpscSendError(#[from] tokio::sync::mpsc::error::SendError<SessionCommand>),
    #[error("Failed to spawn session thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),
    #[error("Invalid session config: {0}")]
    InvalidConfig(#[from] ConfigError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse session config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to parse movie record: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Movie '{id}' has no playable video sources")]
    NoPlayableSources { id: String },
}

// Errors handed across to a UI layer travel as plain strings.
impl From<EngineError> for String {
    fn from(err: EngineError) -> String {
        err.to_string()
    }
}
impl From<PlayRejection> for String {
    fn from(err: PlayRejection) -> String {
        err.to_string()
    }
}
impl From<SessionError> for String {
    fn from(err: SessionError) -> String {
        err.to_string()
    }
}
impl From<ConfigError> for String {
    fn from(err: ConfigError) -> String {
        err.to_string()
    }
}
impl From<CatalogError> for String {
    fn from(err: CatalogError) -> String {
        err.to_string()
    }
}
