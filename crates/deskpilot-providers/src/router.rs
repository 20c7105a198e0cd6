//! Chat-completion routing across the configured backends.
//!
//! All four backends speak JSON over HTTP. Ollama has its own `/api/chat`
//! shape; the other three share the OpenAI `/chat/completions` shape and
//! differ only in base URL and whether an API key is attached. The local
//! gguf server never receives an Authorization header.

use crate::error::ProviderError;
use deskpilot_config::Settings;
use deskpilot_protocol::{ChatMessage, ProviderKind};
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// A completed model call.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub provider: ProviderKind,
    pub model: String,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: WireMessage,
}

#[derive(Deserialize, Default)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: &'a [ChatMessage],
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f64,
}

#[derive(Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    message: Option<WireMessage>,
}

/// Routes chat requests to whichever backend the settings select.
#[derive(Clone, Default)]
pub struct ProviderRouter {
    client: Client,
}

impl ProviderRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send the message transcript to the active provider and return
    /// the assistant text. A response without content yields an empty
    /// string rather than an error.
    pub async fn complete(
        &self,
        settings: &Settings,
        messages: &[ChatMessage],
    ) -> Result<Completion, ProviderError> {
        let provider = settings.provider;
        debug!(
            "dispatching completion (provider={}, messages={})",
            provider.as_str(),
            messages.len()
        );
        let content = match provider {
            ProviderKind::Ollama => self.ollama_chat(settings, messages).await?,
            ProviderKind::OpenAi => {
                let cfg = &settings.providers.openai;
                self.openai_chat(
                    &cfg.base_url,
                    Some(&cfg.api_key),
                    &cfg.model,
                    settings,
                    messages,
                )
                .await?
            }
            ProviderKind::OpenAiCompatible => {
                let cfg = &settings.providers.openai_compatible;
                self.openai_chat(
                    &cfg.base_url,
                    Some(&cfg.api_key),
                    &cfg.model,
                    settings,
                    messages,
                )
                .await?
            }
            ProviderKind::Gguf => {
                let cfg = &settings.providers.gguf;
                self.openai_chat(&cfg.endpoint(), None, &cfg.model_alias, settings, messages)
                    .await?
            }
        };
        Ok(Completion {
            content,
            provider,
            model: settings.active_model().to_string(),
        })
    }

    async fn ollama_chat(
        &self,
        settings: &Settings,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        let cfg = &settings.providers.ollama;
        let url = format!("{}/api/chat", normalize_base_url(&cfg.base_url));
        let response = self
            .client
            .post(url)
            .json(&OllamaRequest {
                model: &cfg.model,
                stream: false,
                messages,
                options: OllamaOptions {
                    temperature: settings.temperature,
                },
            })
            .send()
            .await?;
        let payload: OllamaResponse = check_status(response).await?.json().await?;
        Ok(payload
            .message
            .and_then(|message| message.content)
            .unwrap_or_default())
    }

    async fn openai_chat(
        &self,
        base_url: &str,
        api_key: Option<&str>,
        model: &str,
        settings: &Settings,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", normalize_base_url(base_url));
        let mut request = self.client.post(url).json(&OpenAiRequest {
            model,
            messages,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        });
        if let Some(key) = api_key {
            if !key.is_empty() {
                request = request.bearer_auth(key);
            }
        }
        let payload: OpenAiResponse = check_status(request.send().await?).await?.json().await?;
        Ok(payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }

    /// Probe the active provider's listing endpoint and return a
    /// human-readable success message.
    pub async fn health_check(&self, settings: &Settings) -> Result<String, ProviderError> {
        match settings.provider {
            ProviderKind::Ollama => {
                let url = format!(
                    "{}/api/tags",
                    normalize_base_url(&settings.providers.ollama.base_url)
                );
                check_status(self.client.get(url).send().await?).await?;
                Ok("Connected to Ollama".to_string())
            }
            ProviderKind::Gguf => {
                let url = format!(
                    "{}/models",
                    normalize_base_url(&settings.providers.gguf.endpoint())
                );
                check_status(self.client.get(url).send().await?).await?;
                Ok("Connected to GGUF llama.cpp server".to_string())
            }
            ProviderKind::OpenAi | ProviderKind::OpenAiCompatible => {
                let cfg = match settings.provider {
                    ProviderKind::OpenAi => &settings.providers.openai,
                    _ => &settings.providers.openai_compatible,
                };
                let url = format!("{}/models", normalize_base_url(&cfg.base_url));
                let mut request = self.client.get(url);
                if !cfg.api_key.is_empty() {
                    request = request.bearer_auth(&cfg.api_key);
                }
                check_status(request.send().await?).await?;
                Ok("Connected to OpenAI-compatible endpoint".to_string())
            }
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Http {
        status: status.as_u16(),
        body,
    })
}

/// Drop the trailing slash so path joins stay predictable.
fn normalize_base_url(url: &str) -> &str {
    url.trim().trim_end_matches('/')
}

/// Rough token count used for display-only estimates.
pub fn token_estimate(text: &str) -> usize {
    text.len().div_ceil(4)
}
