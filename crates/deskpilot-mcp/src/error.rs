//! MCP probe error types.

use thiserror::Error;

/// Errors raised while probing an MCP server.
#[derive(Debug, Error)]
pub enum McpError {
    /// A stdio server was configured without a command.
    #[error("missing command for stdio MCP server")]
    MissingCommand,
    /// An SSE server was configured without a URL.
    #[error("missing URL for SSE MCP server")]
    MissingUrl,
    /// The server did not complete the handshake in time.
    #[error("timed out while talking to MCP server: {name}")]
    Timeout { name: String },
    /// The server answered the handshake with a JSON-RPC error, or
    /// closed its output before answering.
    #[error("{0}")]
    Handshake(String),
    /// The server process died before the handshake finished.
    #[error("MCP process exited with code {code}: {stderr}")]
    ProcessExited { code: i32, stderr: String },
    /// Spawning or driving the server process failed.
    #[error(transparent)]
    Process(#[from] deskpilot_process::ProcessError),
    /// The SSE endpoint could not be fetched.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The SSE endpoint answered with a non-success status.
    #[error("unable to reach SSE server ({status})")]
    Unreachable { status: u16 },
    /// A handshake payload could not be serialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
