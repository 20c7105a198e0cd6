//! Chat session operations and model dispatch.

use super::ControlPlane;
use crate::state::AppState;
use deskpilot_protocol::{ChatMessage, ChatSession, DEFAULT_CHAT_TITLE, Message, Role};
use deskpilot_providers::token_estimate;
use log::{info, warn};
use serde::Serialize;
use std::time::Instant;
use uuid::Uuid;

/// Number of characters of the first user message used as an
/// auto-assigned chat title.
const TITLE_CHARS: usize = 40;

/// Result of a send or regenerate, with the updated document.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub state: AppState,
}

impl ControlPlane {
    /// Create a fresh chat and make it active.
    pub async fn new_chat(&self) -> AppState {
        let mut state = self.state.lock().await;
        let chat = ChatSession::default();
        state.active_chat_id = Some(chat.id);
        state.chats.insert(0, chat);
        self.persist(&state);
        state.clone()
    }

    /// Clone a chat, messages included, and make the copy active.
    pub async fn duplicate_chat(&self, chat_id: Uuid) -> AppState {
        let mut state = self.state.lock().await;
        if let Some(chat) = state.chats.iter().find(|chat| chat.id == chat_id) {
            let mut cloned = ChatSession::new(format!("{} (Copy)", chat.title));
            cloned.messages = chat.messages.clone();
            state.active_chat_id = Some(cloned.id);
            state.chats.insert(0, cloned);
            self.persist(&state);
        }
        state.clone()
    }

    /// Switch the active chat; unknown ids leave the selection as-is.
    pub async fn select_chat(&self, chat_id: Uuid) -> AppState {
        let mut state = self.state.lock().await;
        if state.chats.iter().any(|chat| chat.id == chat_id) {
            state.active_chat_id = Some(chat_id);
            self.persist(&state);
        }
        state.clone()
    }

    /// Rename a chat; a blank title keeps the old one.
    pub async fn rename_chat(&self, chat_id: Uuid, title: &str) -> AppState {
        let mut state = self.state.lock().await;
        if let Some(chat) = state.chat_mut(chat_id) {
            let trimmed = title.trim();
            if !trimmed.is_empty() {
                chat.title = trimmed.to_string();
            }
            chat.touch();
            self.persist(&state);
        }
        state.clone()
    }

    /// Delete a chat; the active-chat invariant heals afterwards.
    pub async fn delete_chat(&self, chat_id: Uuid) -> AppState {
        let mut state = self.state.lock().await;
        state.chats.retain(|chat| chat.id != chat_id);
        state.ensure_active_chat();
        self.persist(&state);
        state.clone()
    }

    /// Remove every message from a chat while keeping the record.
    pub async fn clear_messages(&self, chat_id: Uuid) -> AppState {
        let mut state = self.state.lock().await;
        if let Some(chat) = state.chat_mut(chat_id) {
            chat.messages.clear();
            chat.touch();
            self.persist(&state);
        }
        state.clone()
    }

    /// Append the user's message to the active chat and obtain an
    /// assistant reply from the active provider.
    pub async fn send_message(&self, text: &str) -> ChatOutcome {
        self.dispatch(text.to_string(), true).await
    }

    /// Drop trailing assistant messages and resubmit the most recent
    /// user message without duplicating it.
    pub async fn regenerate_last(&self) -> ChatOutcome {
        let last_user = {
            let mut state = self.state.lock().await;
            let chat = state.active_chat_mut();
            let last_user = chat
                .messages
                .iter()
                .rev()
                .find(|message| message.role == Role::User)
                .map(|message| message.content.clone());
            let Some(last_user) = last_user else {
                return ChatOutcome {
                    ok: false,
                    error: Some("No user message found to regenerate from.".to_string()),
                    state: state.clone(),
                };
            };
            while chat
                .messages
                .last()
                .is_some_and(|message| message.role == Role::Assistant)
            {
                chat.messages.pop();
            }
            chat.touch();
            self.persist(&state);
            last_user
        };
        self.dispatch(last_user, false).await
    }

    async fn dispatch(&self, text: String, append_user: bool) -> ChatOutcome {
        let mut state = self.state.lock().await;
        let provider = state.settings.provider;
        let model = state.settings.active_model().to_string();
        let system = format!(
            "{}\n{}",
            state.settings.system_prompt,
            state.settings.personality.directive()
        );
        let settings = state.settings.clone();

        let transcript = {
            let chat = state.active_chat_mut();
            if append_user {
                let mut message = Message::new(Role::User, text.as_str());
                message.meta.provider = Some(provider.as_str().to_string());
                message.meta.model = Some(model.clone());
                chat.messages.push(message);
            }
            chat.touch();
            let mut transcript = vec![ChatMessage {
                role: Role::System,
                content: system,
            }];
            transcript.extend(chat.messages.iter().map(ChatMessage::from));
            transcript
        };
        self.persist(&state);

        let prompt_estimate = token_estimate(
            &transcript
                .iter()
                .map(|message| message.content.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        );
        let started = Instant::now();

        match self.router.complete(&settings, &transcript).await {
            Ok(completion) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                let completion_estimate = token_estimate(&completion.content);
                info!(
                    "model call completed (provider={}, latency_ms={})",
                    provider.as_str(),
                    latency_ms
                );
                let chat = state.active_chat_mut();
                let mut message = Message::new(Role::Assistant, completion.content);
                message.meta.latency_ms = Some(latency_ms);
                message.meta.prompt_tokens_estimate = Some(prompt_estimate);
                message.meta.completion_tokens_estimate = Some(completion_estimate);
                message.meta.total_tokens_estimate = Some(prompt_estimate + completion_estimate);
                message.meta.provider = Some(provider.as_str().to_string());
                message.meta.model = Some(model);
                chat.messages.push(message);

                if chat.title == DEFAULT_CHAT_TITLE {
                    let title: String = chat
                        .messages
                        .iter()
                        .find(|message| message.role == Role::User)
                        .map(|message| message.content.chars().take(TITLE_CHARS).collect())
                        .unwrap_or_default();
                    if !title.is_empty() {
                        chat.title = title;
                    }
                }
                chat.touch();
                self.persist(&state);
                ChatOutcome {
                    ok: true,
                    error: None,
                    state: state.clone(),
                }
            }
            Err(err) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                warn!("model call failed (provider={}): {err}", provider.as_str());
                let chat = state.active_chat_mut();
                let mut message = Message::new(Role::Assistant, format!("Error: {err}"));
                message.is_error = true;
                message.meta.latency_ms = Some(latency_ms);
                message.meta.prompt_tokens_estimate = Some(prompt_estimate);
                message.meta.provider = Some(provider.as_str().to_string());
                message.meta.model = Some(model);
                chat.messages.push(message);
                chat.touch();
                self.persist(&state);
                ChatOutcome {
                    ok: false,
                    error: Some(err.to_string()),
                    state: state.clone(),
                }
            }
        }
    }
}
