//! Typed deep-merge patches for settings updates.
//!
//! A patch carries only the fields the caller wants to change; `apply`
//! merges it recursively into the stored settings. Provider blocks the
//! patch does not mention keep every stored field.

use crate::model::{Personality, Settings};
use deskpilot_protocol::{McpServerConfig, ProviderKind};
use serde::Deserialize;

macro_rules! apply_field {
    ($target:expr, $patch:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = $patch.$field {
                $target.$field = value;
            }
        )+
    };
}

/// Partial override for the top-level settings.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub provider: Option<ProviderKind>,
    pub system_prompt: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub personality: Option<Personality>,
    pub providers: Option<ProvidersPatch>,
    pub mcp_servers: Option<Vec<McpServerConfig>>,
}

/// Partial override for the per-provider blocks.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersPatch {
    pub openai: Option<OpenAiPatch>,
    pub openai_compatible: Option<OpenAiPatch>,
    pub ollama: Option<OllamaPatch>,
    pub gguf: Option<GgufPatch>,
}

/// Partial override for an OpenAI-shaped provider block.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenAiPatch {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
}

/// Partial override for the Ollama block.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OllamaPatch {
    pub base_url: Option<String>,
    pub model: Option<String>,
}

/// Partial override for the local inference server block.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GgufPatch {
    pub binary_path: Option<String>,
    pub model_path: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub ctx_size: Option<u32>,
    pub gpu_layers: Option<u32>,
    pub model_alias: Option<String>,
}

impl Settings {
    /// Merge a patch into these settings, field by field.
    pub fn apply(&mut self, patch: SettingsPatch) {
        apply_field!(
            self,
            patch,
            provider,
            system_prompt,
            temperature,
            max_tokens,
            personality,
        );
        if let Some(providers) = patch.providers {
            if let Some(openai) = providers.openai {
                apply_field!(self.providers.openai, openai, base_url, api_key, model);
            }
            if let Some(compatible) = providers.openai_compatible {
                apply_field!(
                    self.providers.openai_compatible,
                    compatible,
                    base_url,
                    api_key,
                    model,
                );
            }
            if let Some(ollama) = providers.ollama {
                apply_field!(self.providers.ollama, ollama, base_url, model);
            }
            if let Some(gguf) = providers.gguf {
                apply_field!(
                    self.providers.gguf,
                    gguf,
                    binary_path,
                    model_path,
                    host,
                    port,
                    ctx_size,
                    gpu_layers,
                    model_alias,
                );
            }
        }
        if let Some(servers) = patch.mcp_servers {
            self.mcp_servers = servers;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{OpenAiPatch, ProvidersPatch, SettingsPatch};
    use crate::model::Settings;
    use deskpilot_protocol::ProviderKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn apply_merges_single_provider_field() {
        let mut settings = Settings::default();
        let before = settings.clone();

        settings.apply(SettingsPatch {
            providers: Some(ProvidersPatch {
                openai: Some(OpenAiPatch {
                    model: Some("x".to_string()),
                    ..OpenAiPatch::default()
                }),
                ..ProvidersPatch::default()
            }),
            ..SettingsPatch::default()
        });

        assert_eq!(settings.providers.openai.model, "x".to_string());
        assert_eq!(
            settings.providers.openai.base_url,
            before.providers.openai.base_url
        );
        assert_eq!(settings.providers.openai_compatible, before.providers.openai_compatible);
        assert_eq!(settings.providers.ollama, before.providers.ollama);
        assert_eq!(settings.providers.gguf, before.providers.gguf);
    }

    #[test]
    fn apply_switches_provider_without_clearing_blocks() {
        let mut settings = Settings::default();
        settings.apply(SettingsPatch {
            provider: Some(ProviderKind::Ollama),
            ..SettingsPatch::default()
        });
        assert_eq!(settings.provider, ProviderKind::Ollama);
        assert_eq!(settings.providers.openai.model, "gpt-4o-mini".to_string());
    }

    #[test]
    fn patch_deserializes_partial_json() {
        let patch: SettingsPatch =
            serde_json::from_str(r#"{"providers":{"gguf":{"port":9090}}}"#).expect("patch");
        let mut settings = Settings::default();
        settings.apply(patch);
        assert_eq!(settings.providers.gguf.port, 9090);
        assert_eq!(settings.providers.gguf.host, "127.0.0.1".to_string());
    }

    #[test]
    fn mcp_servers_replace_when_present() {
        let mut settings = Settings::default();
        let patch: SettingsPatch = serde_json::from_str(
            r#"{"mcpServers":[{"name":"local","command":"npx","args":"-y tool"}]}"#,
        )
        .expect("patch");
        settings.apply(patch);
        assert_eq!(settings.mcp_servers.len(), 1);
        assert_eq!(settings.mcp_servers[0].args, vec!["-y".to_string(), "tool".to_string()]);
    }
}
