//! Settings schema for deskpilot.

use crate::error::ConfigError;
use deskpilot_protocol::{McpServerConfig, ProviderKind};
use serde::{Deserialize, Serialize};

/// Top-level application settings.
///
/// Exactly one provider is active at a time (`provider`); the inactive
/// variants keep their stored configuration so switching back is lossless.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub provider: ProviderKind,
    pub system_prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub personality: Personality,
    pub providers: ProviderSettings,
    pub mcp_servers: Vec<McpServerConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            system_prompt: default_system_prompt(),
            temperature: 0.2,
            max_tokens: 2048,
            personality: Personality::Conversational,
            providers: ProviderSettings::default(),
            mcp_servers: Vec::new(),
        }
    }
}

fn default_system_prompt() -> String {
    "You are Deskpilot, a highly capable coding assistant.".to_string()
}

/// Response style directive appended to the system prompt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    #[default]
    Conversational,
    Terse,
}

impl Personality {
    /// The directive line appended to the system prompt.
    pub fn directive(&self) -> &'static str {
        match self {
            Personality::Terse => "Respond tersely and with minimal verbosity.",
            Personality::Conversational => {
                "Respond conversationally, explaining key tradeoffs."
            }
        }
    }
}

/// Per-provider configuration blocks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderSettings {
    pub openai: OpenAiSettings,
    pub openai_compatible: OpenAiSettings,
    pub ollama: OllamaSettings,
    pub gguf: GgufSettings,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            openai: OpenAiSettings {
                base_url: "https://api.openai.com/v1".to_string(),
                api_key: String::new(),
                model: "gpt-4o-mini".to_string(),
            },
            openai_compatible: OpenAiSettings {
                base_url: "http://localhost:1234/v1".to_string(),
                api_key: "not-needed".to_string(),
                model: "local-model".to_string(),
            },
            ollama: OllamaSettings::default(),
            gguf: GgufSettings::default(),
        }
    }
}

/// Settings shared by the hosted and OpenAI-compatible variants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenAiSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

/// Settings for the Ollama backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OllamaSettings {
    pub base_url: String,
    pub model: String,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.1:8b".to_string(),
        }
    }
}

/// Settings for the self-managed local inference server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GgufSettings {
    pub binary_path: String,
    pub model_path: String,
    pub host: String,
    pub port: u16,
    pub ctx_size: u32,
    pub gpu_layers: u32,
    pub model_alias: String,
}

impl Default for GgufSettings {
    fn default() -> Self {
        Self {
            binary_path: String::new(),
            model_path: String::new(),
            host: "127.0.0.1".to_string(),
            port: 8080,
            ctx_size: 8192,
            gpu_layers: 0,
            model_alias: "gguf-local-model".to_string(),
        }
    }
}

impl GgufSettings {
    /// Base URL of the local inference server's OpenAI-shaped API.
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}/v1", self.host, self.port)
    }

    /// Require the binary and model paths before a server start.
    pub fn require_paths(&self) -> Result<(), ConfigError> {
        if self.binary_path.trim().is_empty() {
            return Err(ConfigError::MissingSetting(
                "providers.gguf.binaryPath".to_string(),
            ));
        }
        if self.model_path.trim().is_empty() {
            return Err(ConfigError::MissingSetting(
                "providers.gguf.modelPath".to_string(),
            ));
        }
        Ok(())
    }
}

impl Settings {
    /// Model name reported for the active provider.
    pub fn active_model(&self) -> &str {
        match self.provider {
            ProviderKind::OpenAi => &self.providers.openai.model,
            ProviderKind::OpenAiCompatible => &self.providers.openai_compatible.model,
            ProviderKind::Ollama => &self.providers.ollama.model,
            ProviderKind::Gguf => &self.providers.gguf.model_alias,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GgufSettings, Settings};
    use deskpilot_protocol::ProviderKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn settings_deserialize_from_empty_document() {
        let settings: Settings = serde_json::from_str("{}").expect("settings");
        assert_eq!(settings.provider, ProviderKind::OpenAi);
        assert_eq!(settings.temperature, 0.2);
        assert_eq!(settings.providers.ollama.model, "llama3.1:8b".to_string());
    }

    #[test]
    fn settings_round_trip_camel_case() {
        let settings = Settings::default();
        let value = serde_json::to_value(&settings).expect("serialize");
        assert_eq!(value["maxTokens"], 2048);
        assert_eq!(value["providers"]["openaiCompatible"]["apiKey"], "not-needed");
        let back: Settings = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, settings);
    }

    #[test]
    fn gguf_endpoint_formats_host_and_port() {
        let gguf = GgufSettings::default();
        assert_eq!(gguf.endpoint(), "http://127.0.0.1:8080/v1".to_string());
    }

    #[test]
    fn gguf_require_paths_rejects_blank_values() {
        let gguf = GgufSettings::default();
        let err = gguf.require_paths().expect_err("missing paths");
        assert_eq!(
            err.to_string(),
            "missing required setting: providers.gguf.binaryPath".to_string()
        );
    }

    #[test]
    fn active_model_follows_provider() {
        let mut settings = Settings::default();
        settings.provider = ProviderKind::Gguf;
        assert_eq!(settings.active_model(), "gguf-local-model");
        settings.provider = ProviderKind::OpenAi;
        assert_eq!(settings.active_model(), "gpt-4o-mini");
    }
}
