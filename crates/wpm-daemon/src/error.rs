//! Daemon error types.

use thiserror::Error;
use wpm_monitor::MonitorError;

/// Errors surfaced by the daemon.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Monitor(#[from] MonitorError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("input capture error: {0}")]
    Input(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<config::ConfigError> for DaemonError {
    fn from(e: config::ConfigError) -> Self {
        DaemonError::Config(e.to_string())
    }
}

pub type DaemonResult<T> = Result<T, DaemonError>;
