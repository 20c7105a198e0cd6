//! Error types for settings validation.

use thiserror::Error;

/// Errors returned while validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting has no value.
    #[error("missing required setting: {0}")]
    MissingSetting(String),
    /// A setting holds an unusable value.
    #[error("invalid setting {field}: {message}")]
    InvalidSetting { field: String, message: String },
}
