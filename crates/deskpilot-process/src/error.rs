//! Process error types.

use thiserror::Error;

/// Errors returned by subprocess management.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Spawning the child process failed.
    #[error("failed to spawn process: {0}")]
    Spawn(std::io::Error),
    /// IO error while talking to a child.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A required setting is absent.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<deskpilot_config::ConfigError> for ProcessError {
    fn from(err: deskpilot_config::ConfigError) -> Self {
        ProcessError::Configuration(err.to_string())
    }
}
