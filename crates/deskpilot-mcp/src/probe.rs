//! MCP server probing.
//!
//! A stdio probe spawns the configured command and walks the JSON-RPC
//! handshake: `initialize` (id 1) then `tools/list` (id 2), each sent
//! as one newline-terminated JSON object. An SSE probe only checks
//! that the endpoint answers a GET. Probes always terminate the child
//! before returning.

use crate::error::McpError;
use deskpilot_process::{ProcessEvent, ProcessHandle};
use deskpilot_protocol::{DEFAULT_MCP_TIMEOUT_MS, McpServerConfig, McpTool, McpTransport};
use log::{debug, info};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
const CLIENT_NAME: &str = "deskpilot";
const CLIENT_VERSION: &str = "1.0.0";

/// Result of a successful probe.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub message: String,
    pub tools: Vec<McpTool>,
}

/// Probes MCP servers over stdio or SSE.
#[derive(Clone, Default)]
pub struct McpProber {
    client: reqwest::Client,
}

impl McpProber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe one configured server and list its tools.
    pub async fn probe(&self, server: &McpServerConfig) -> Result<ProbeReport, McpError> {
        match server.transport {
            McpTransport::Stdio => {
                if server.command.trim().is_empty() {
                    return Err(McpError::MissingCommand);
                }
                let tools = probe_stdio(server).await?;
                info!(
                    "mcp probe succeeded (name={}, tools={})",
                    server.name,
                    tools.len()
                );
                Ok(ProbeReport {
                    message: format!("Connected: {} ({} tools)", server.name, tools.len()),
                    tools,
                })
            }
            McpTransport::Sse => {
                if server.url.trim().is_empty() {
                    return Err(McpError::MissingUrl);
                }
                let response = self.client.get(&server.url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(McpError::Unreachable {
                        status: status.as_u16(),
                    });
                }
                Ok(ProbeReport {
                    message: format!("Reachable SSE endpoint: {}", server.url),
                    tools: Vec::new(),
                })
            }
        }
    }
}

async fn probe_stdio(server: &McpServerConfig) -> Result<Vec<McpTool>, McpError> {
    let mut handle = ProcessHandle::spawn_argv(&server.command, &server.args, None)?;
    let timeout_ms = if server.timeout_ms == 0 {
        DEFAULT_MCP_TIMEOUT_MS
    } else {
        server.timeout_ms
    };
    let result = tokio::time::timeout(
        Duration::from_millis(timeout_ms),
        drive_handshake(&mut handle),
    )
    .await;
    // The child is ours alone; never leave it running.
    handle.kill();
    match result {
        Ok(outcome) => outcome,
        Err(_) => Err(McpError::Timeout {
            name: server.name.clone(),
        }),
    }
}

async fn drive_handshake(handle: &mut ProcessHandle) -> Result<Vec<McpTool>, McpError> {
    let mut events: UnboundedReceiver<ProcessEvent> = handle
        .take_events()
        .ok_or_else(|| McpError::Handshake("event stream already consumed".to_string()))?;

    send(
        handle,
        &json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": { "name": CLIENT_NAME, "version": CLIENT_VERSION }
            }
        }),
    )?;

    let mut pending = String::new();
    let mut stderr = String::new();
    while let Some(event) = events.recv().await {
        match event {
            ProcessEvent::Stdout(chunk) => {
                pending.push_str(&chunk);
                while let Some(newline) = pending.find('\n') {
                    let line: String = pending.drain(..=newline).collect();
                    if let Some(tools) = handle_line(line.trim(), handle)? {
                        return Ok(tools);
                    }
                }
            }
            ProcessEvent::Stderr(chunk) => stderr.push_str(&chunk),
            ProcessEvent::Exited(code) => {
                return match code {
                    // Exit by signal is how we terminate servers
                    // ourselves, so it is not an error on its own.
                    Some(code) if code != 0 => Err(McpError::ProcessExited {
                        code,
                        stderr: stderr.trim().to_string(),
                    }),
                    _ => Err(McpError::Handshake(
                        "MCP server closed its output before responding".to_string(),
                    )),
                };
            }
        }
    }
    Err(McpError::Handshake(
        "MCP server closed its output before responding".to_string(),
    ))
}

/// Handle one line of server output. Returns the tool list once the
/// `tools/list` response arrives; malformed lines are ignored.
fn handle_line(line: &str, handle: &ProcessHandle) -> Result<Option<Vec<McpTool>>, McpError> {
    if line.is_empty() {
        return Ok(None);
    }
    let Ok(message) = serde_json::from_str::<Value>(line) else {
        debug!("ignoring non-JSON MCP output (len={})", line.len());
        return Ok(None);
    };

    if message["id"] == 1 && message.get("error").is_none() {
        send(
            handle,
            &json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list", "params": {} }),
        )?;
        return Ok(None);
    }

    if message["id"] == 2 {
        if let Some(error) = message.get("error") {
            let detail = error["message"]
                .as_str()
                .unwrap_or("MCP tools/list failed")
                .to_string();
            return Err(McpError::Handshake(detail));
        }

        #[derive(Deserialize, Default)]
        struct ToolsResult {
            #[serde(default)]
            tools: Vec<McpTool>,
        }
        let result: ToolsResult =
            serde_json::from_value(message["result"].clone()).unwrap_or_default();
        return Ok(Some(result.tools));
    }

    Ok(None)
}

fn send(handle: &ProcessHandle, payload: &Value) -> Result<(), McpError> {
    let line = format!("{payload}\n");
    if !handle.write(line) {
        return Err(McpError::Handshake(
            "MCP server closed stdin before responding".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{McpProber, ProbeReport};
    use axum::Router;
    use axum::routing::get;
    use deskpilot_protocol::{McpServerConfig, McpTransport};
    use pretty_assertions::assert_eq;

    fn stdio_server(script: &str, timeout_ms: u64) -> McpServerConfig {
        McpServerConfig {
            name: "fixture".to_string(),
            transport: McpTransport::Stdio,
            command: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            timeout_ms,
            ..McpServerConfig::default()
        }
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn missing_command_is_rejected_before_spawn() {
        let server = McpServerConfig::default();
        let err = McpProber::new().probe(&server).await.expect_err("error");
        assert_eq!(err.to_string(), "missing command for stdio MCP server");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stdio_handshake_lists_tools() {
        let script = concat!(
            "read init\n",
            "printf '%s\\n' '{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{}}'\n",
            "read list\n",
            "printf '%s\\n' '{\"jsonrpc\":\"2.0\",\"id\":2,\"result\":{\"tools\":",
            "[{\"name\":\"search\",\"description\":\"find things\"},{\"name\":\"fetch\"}]}}'\n",
            "sleep 5\n",
        );
        let server = stdio_server(script, 5_000);
        let report = McpProber::new().probe(&server).await.expect("report");
        assert_eq!(report.message, "Connected: fixture (2 tools)".to_string());
        assert_eq!(report.tools[0].name, "search".to_string());
        assert_eq!(report.tools[0].description, "find things".to_string());
        assert_eq!(report.tools[1].description, "".to_string());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn silent_server_times_out() {
        let server = stdio_server("sleep 5", 200);
        let err = McpProber::new().probe(&server).await.expect_err("timeout");
        assert_eq!(
            err.to_string(),
            "timed out while talking to MCP server: fixture"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn crashing_server_surfaces_stderr() {
        let server = stdio_server("echo nope 1>&2; exit 3", 5_000);
        let err = McpProber::new().probe(&server).await.expect_err("exit");
        assert_eq!(err.to_string(), "MCP process exited with code 3: nope");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn tools_list_error_is_reported() {
        let script = concat!(
            "read init\n",
            "printf '%s\\n' '{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{}}'\n",
            "read list\n",
            "printf '%s\\n' '{\"jsonrpc\":\"2.0\",\"id\":2,\"error\":{\"message\":\"no tools\"}}'\n",
            "sleep 5\n",
        );
        let server = stdio_server(script, 5_000);
        let err = McpProber::new().probe(&server).await.expect_err("handshake");
        assert_eq!(err.to_string(), "no tools");
    }

    #[tokio::test]
    async fn sse_probe_only_checks_reachability() {
        let base = serve(Router::new().route("/events", get(|| async { "ok" }))).await;
        let url = format!("{base}/events");
        let server = McpServerConfig {
            transport: McpTransport::Sse,
            url: url.clone(),
            ..McpServerConfig::default()
        };
        let report = McpProber::new().probe(&server).await.expect("report");
        assert_eq!(
            report,
            ProbeReport {
                message: format!("Reachable SSE endpoint: {url}"),
                tools: Vec::new(),
            }
        );
    }

    #[tokio::test]
    async fn sse_probe_reports_http_failures() {
        let base = serve(Router::new()).await;
        let server = McpServerConfig {
            transport: McpTransport::Sse,
            url: format!("{base}/missing"),
            ..McpServerConfig::default()
        };
        let err = McpProber::new().probe(&server).await.expect_err("status");
        assert_eq!(err.to_string(), "unable to reach SSE server (404)");
    }

    #[tokio::test]
    async fn sse_probe_requires_a_url() {
        let server = McpServerConfig {
            transport: McpTransport::Sse,
            ..McpServerConfig::default()
        };
        let err = McpProber::new().probe(&server).await.expect_err("error");
        assert_eq!(err.to_string(), "missing URL for SSE MCP server");
    }
}
