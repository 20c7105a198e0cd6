//! Settings, provider health, MCP, inference server, and terminal
//! boundary operations.

use super::{ActionResult, ControlPlane};
use deskpilot_config::{Settings, SettingsPatch};
use deskpilot_process::{PollResult, ServerStatus};
use deskpilot_protocol::{McpServerConfig, McpTool};
use log::info;
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

/// `{ok, status, message}` result for server start/stop.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServerAction {
    pub ok: bool,
    pub status: ServerStatus,
    pub message: String,
}

/// Result of probing one MCP server.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct McpTestOutcome {
    pub ok: bool,
    pub message: String,
    pub tools: Vec<McpTool>,
}

/// Result of opening a terminal session.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TerminalStarted {
    pub ok: bool,
    pub id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ControlPlane {
    /// Deep-merge a partial settings override and persist.
    pub async fn update_settings(&self, patch: SettingsPatch) -> Settings {
        let mut state = self.state.lock().await;
        state.settings.apply(patch);
        self.persist(&state);
        state.settings.clone()
    }

    /// Probe the active provider's listing endpoint.
    pub async fn test_connection(&self) -> ActionResult {
        let settings = self.state.lock().await.settings.clone();
        match self.router.health_check(&settings).await {
            Ok(message) => ActionResult::ok(message),
            Err(err) => ActionResult::err(err.to_string()),
        }
    }

    pub async fn mcp_list(&self) -> Vec<McpServerConfig> {
        self.state.lock().await.settings.mcp_servers.clone()
    }

    /// Replace the stored MCP server list wholesale.
    pub async fn mcp_save(&self, servers: Vec<McpServerConfig>) -> Vec<McpServerConfig> {
        let mut state = self.state.lock().await;
        state.settings.mcp_servers = servers;
        self.persist(&state);
        state.settings.mcp_servers.clone()
    }

    /// Probe one configured MCP server and list its tools.
    pub async fn mcp_test(&self, server_id: Uuid) -> McpTestOutcome {
        let server = self
            .state
            .lock()
            .await
            .settings
            .mcp_servers
            .iter()
            .find(|server| server.id == server_id)
            .cloned();
        let Some(server) = server else {
            return McpTestOutcome {
                ok: false,
                message: "Server not found".to_string(),
                tools: Vec::new(),
            };
        };
        match self.prober.probe(&server).await {
            Ok(report) => McpTestOutcome {
                ok: true,
                message: report.message,
                tools: report.tools,
            },
            Err(err) => McpTestOutcome {
                ok: false,
                message: err.to_string(),
                tools: Vec::new(),
            },
        }
    }

    /// Start the local inference server from the stored gguf settings.
    pub async fn server_start(&self) -> ServerAction {
        let gguf = self.state.lock().await.settings.providers.gguf.clone();
        match self.server.start(&gguf) {
            Ok(outcome) => ServerAction {
                ok: true,
                status: self.server.status(),
                message: if outcome.started {
                    "GGUF server started.".to_string()
                } else {
                    "GGUF server already running.".to_string()
                },
            },
            Err(err) => ServerAction {
                ok: false,
                status: self.server.status(),
                message: err.to_string(),
            },
        }
    }

    pub fn server_stop(&self) -> ServerAction {
        let was_running = self.server.stop();
        ServerAction {
            ok: true,
            status: self.server.status(),
            message: if was_running {
                "GGUF server stopped.".to_string()
            } else {
                "GGUF server is not running.".to_string()
            },
        }
    }

    pub fn server_status(&self) -> ServerStatus {
        self.server.status()
    }

    /// Open a terminal session, defaulting to the project root.
    pub fn terminal_start(&self, command: Option<&str>, cwd: Option<&str>) -> TerminalStarted {
        let cwd: PathBuf = cwd
            .map(PathBuf::from)
            .unwrap_or_else(|| self.sandbox.root().to_path_buf());
        match self.terminals.start(command, Some(cwd.as_path())) {
            Ok(id) => {
                info!("terminal opened (id={id})");
                TerminalStarted {
                    ok: true,
                    id: Some(id),
                    message: None,
                }
            }
            Err(err) => TerminalStarted {
                ok: false,
                id: None,
                message: Some(err.to_string()),
            },
        }
    }

    pub fn terminal_write(&self, id: Uuid, input: &str) -> bool {
        self.terminals.write(id, input)
    }

    pub fn terminal_poll(&self, id: Uuid) -> PollResult {
        self.terminals.poll(id)
    }

    pub fn terminal_stop(&self, id: Uuid) -> bool {
        self.terminals.stop(id)
    }
}
