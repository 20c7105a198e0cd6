//! Chat message and session records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Stable string form used in logs and wire payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Best-effort diagnostics attached to a message.
///
/// None of these fields are required for correctness; they survive
/// round-trips through the persisted document for display only.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageMeta {
    pub latency_ms: Option<u64>,
    pub prompt_tokens_estimate: Option<usize>,
    pub completion_tokens_estimate: Option<usize>,
    pub total_tokens_estimate: Option<usize>,
    pub provider: Option<String>,
    pub model: Option<String>,
}

/// A single persisted chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub meta: MessageMeta,
}

impl Message {
    /// Build a plain message with empty metadata.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
            is_error: false,
            meta: MessageMeta::default(),
        }
    }
}

/// Wire-level `{role, content}` pair sent to a provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Default placeholder title for a freshly created chat.
pub const DEFAULT_CHAT_TITLE: &str = "New Chat";

/// A persisted chat session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default = "default_chat_title")]
    pub title: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

fn default_chat_title() -> String {
    DEFAULT_CHAT_TITLE.to_string()
}

impl ChatSession {
    /// Create an empty chat with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
        }
    }

    /// Mark the chat as touched.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(DEFAULT_CHAT_TITLE)
    }
}

#[cfg(test)]
mod tests {
    use super::{ChatSession, DEFAULT_CHAT_TITLE, Message, Role};
    use pretty_assertions::assert_eq;

    #[test]
    fn message_deserializes_with_missing_fields() {
        let message: Message =
            serde_json::from_str(r#"{"role":"user","content":"hi"}"#).expect("message");
        assert_eq!(message.role, Role::User);
        assert_eq!(message.content, "hi".to_string());
        assert_eq!(message.is_error, false);
        assert_eq!(message.meta.latency_ms, None);
    }

    #[test]
    fn message_meta_round_trips_camel_case() {
        let mut message = Message::new(Role::Assistant, "done");
        message.meta.latency_ms = Some(12);
        message.meta.provider = Some("ollama".to_string());

        let value = serde_json::to_value(&message).expect("serialize");
        assert_eq!(value["meta"]["latencyMs"], 12);
        assert_eq!(value["isError"], false);

        let back: Message = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, message);
    }

    #[test]
    fn chat_session_defaults_title() {
        let chat: ChatSession = serde_json::from_str(r#"{"messages":[]}"#).expect("chat");
        assert_eq!(chat.title, DEFAULT_CHAT_TITLE.to_string());
        assert_eq!(chat.messages.is_empty(), true);
    }
}
