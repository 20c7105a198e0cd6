//! MCP (Model Context Protocol) server probing for deskpilot.
//!
//! Supports stdio servers, reached through a spawned process and a
//! two-step JSON-RPC handshake, and SSE servers, reached with a plain
//! HTTP GET.

pub mod error;
pub mod probe;

/// MCP probe error type.
pub use error::McpError;
/// Server probing and tool listing.
pub use probe::{McpProber, ProbeReport};
