//! MCP server configuration records.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Transport used to reach an MCP server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum McpTransport {
    #[default]
    Stdio,
    Sse,
}

/// Default probe timeout in milliseconds.
pub const DEFAULT_MCP_TIMEOUT_MS: u64 = 12_000;

/// Persisted configuration for one MCP server.
///
/// Validated lazily at probe time, never at save time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct McpServerConfig {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default = "default_server_name")]
    pub name: String,
    #[serde(default)]
    pub transport: McpTransport,
    #[serde(default)]
    pub command: String,
    #[serde(default, deserialize_with = "args_from_string_or_seq")]
    pub args: Vec<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for McpServerConfig {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: default_server_name(),
            transport: McpTransport::Stdio,
            command: String::new(),
            args: Vec::new(),
            url: String::new(),
            enabled: true,
            timeout_ms: DEFAULT_MCP_TIMEOUT_MS,
        }
    }
}

fn default_server_name() -> String {
    "MCP Server".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    DEFAULT_MCP_TIMEOUT_MS
}

/// Accept `args` as either an array or a single command-line string.
fn args_from_string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrSeq {
        Seq(Vec<String>),
        String(String),
    }

    match StringOrSeq::deserialize(deserializer)? {
        StringOrSeq::Seq(args) => Ok(args),
        StringOrSeq::String(raw) => {
            shell_words::split(&raw).map_err(|err| serde::de::Error::custom(err.to_string()))
        }
    }
}

/// A tool advertised by an MCP server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct McpTool {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_MCP_TIMEOUT_MS, McpServerConfig, McpTransport};
    use pretty_assertions::assert_eq;

    #[test]
    fn mcp_server_fills_defaults() {
        let server: McpServerConfig = serde_json::from_str("{}").expect("server");
        assert_eq!(server.name, "MCP Server".to_string());
        assert_eq!(server.transport, McpTransport::Stdio);
        assert_eq!(server.enabled, true);
        assert_eq!(server.timeout_ms, DEFAULT_MCP_TIMEOUT_MS);
    }

    #[test]
    fn mcp_server_accepts_args_as_string() {
        let server: McpServerConfig =
            serde_json::from_str(r#"{"command":"npx","args":"-y my-server --flag"}"#)
                .expect("server");
        assert_eq!(
            server.args,
            vec![
                "-y".to_string(),
                "my-server".to_string(),
                "--flag".to_string()
            ]
        );
    }

    #[test]
    fn mcp_server_accepts_args_as_array() {
        let server: McpServerConfig =
            serde_json::from_str(r#"{"args":["--port","8080"]}"#).expect("server");
        assert_eq!(server.args, vec!["--port".to_string(), "8080".to_string()]);
    }
}
