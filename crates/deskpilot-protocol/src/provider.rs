//! Provider discriminant shared by settings and the router.

use serde::{Deserialize, Serialize};

/// Which chat-completion backend is active.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "openaiCompatible")]
    OpenAiCompatible,
    #[serde(rename = "ollama")]
    Ollama,
    #[serde(rename = "gguf")]
    Gguf,
}

impl ProviderKind {
    /// Stable identifier matching the persisted document.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::OpenAiCompatible => "openaiCompatible",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Gguf => "gguf",
        }
    }
}
