//! Shared domain types for deskpilot.
//!
//! This crate owns the chat, provider, and MCP configuration models used
//! across the control plane. Field names serialize in camelCase so the
//! persisted document stays compatible with earlier releases.

pub mod chat;
pub mod mcp;
pub mod provider;

/// Chat roles, messages, and session records.
pub use chat::{ChatMessage, ChatSession, DEFAULT_CHAT_TITLE, Message, MessageMeta, Role};
/// MCP server configuration and probe results.
pub use mcp::{DEFAULT_MCP_TIMEOUT_MS, McpServerConfig, McpTool, McpTransport};
/// Provider discriminant.
pub use provider::ProviderKind;
