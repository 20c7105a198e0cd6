//! Chat-completion backends for deskpilot.
//!
//! One router fans out to the configured provider: hosted OpenAI, any
//! OpenAI-compatible endpoint, Ollama, or the self-managed local gguf
//! server. Requests and responses are plain JSON over reqwest.

pub mod error;
pub mod router;

/// Provider error type.
pub use error::ProviderError;
/// Completion routing and health checks.
pub use router::{Completion, ProviderRouter, token_estimate};
