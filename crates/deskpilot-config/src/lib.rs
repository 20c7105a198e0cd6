//! Settings schema and typed deep-merge for deskpilot.
//!
//! This crate owns the application settings model, its defaults, and the
//! patch layer used by `updateSettings`: partial overrides merge
//! recursively into the stored settings without disturbing untouched
//! provider blocks.

mod error;
mod model;
mod patch;

/// Public error type for config validation.
pub use error::ConfigError;
/// Settings schema models.
pub use model::{
    GgufSettings, OllamaSettings, OpenAiSettings, Personality, ProviderSettings, Settings,
};
/// Partial-override patch types.
pub use patch::{
    GgufPatch, OllamaPatch, OpenAiPatch, ProvidersPatch, SettingsPatch,
};
