//! The control plane: every operation the presentation layer calls.
//!
//! Boundary rule: operations here never raise past the interface.
//! Component failures are caught and folded into `{ok, message}`
//! shaped results; the state document is persisted after every
//! mutation.

mod agents;
mod chat;
mod research;
mod runtime;
mod workspace;

pub use agents::AgentPatch;
pub use chat::ChatOutcome;
pub use research::{PromoteOutcome, ResearchOutcome};
pub use runtime::{McpTestOutcome, ServerAction, TerminalStarted};
pub use workspace::{PathOutcome, ReadOutcome, RenameOutcome, TreeOutcome};

use crate::state::AppState;
use crate::store::StateStore;
use deskpilot_mcp::McpProber;
use deskpilot_process::{InferenceServerManager, ServerStatus, TerminalManager};
use deskpilot_providers::ProviderRouter;
use deskpilot_sandbox::ProjectSandbox;
use log::{error, info};
use serde::Serialize;
use std::path::Path;
use tokio::sync::Mutex;

/// Generic `{ok, message}` result for boundary operations.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActionResult {
    pub ok: bool,
    pub message: String,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Server-side runtime facts that are not persisted.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RuntimeStatus {
    pub gguf: ServerStatus,
}

/// Initial payload handed to the presentation layer.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bootstrap {
    #[serde(flatten)]
    pub state: AppState,
    pub runtime: RuntimeStatus,
}

/// Owns every subsystem and the single mutable application document.
pub struct ControlPlane {
    pub(crate) store: StateStore,
    pub(crate) state: Mutex<AppState>,
    pub(crate) router: ProviderRouter,
    pub(crate) prober: McpProber,
    pub(crate) server: InferenceServerManager,
    pub(crate) terminals: TerminalManager,
    pub(crate) sandbox: ProjectSandbox,
}

impl ControlPlane {
    /// Load (or initialize) the document and wire up the subsystems.
    pub fn new(db_path: impl AsRef<Path>, project_root: impl AsRef<Path>) -> Self {
        let store = StateStore::new(db_path.as_ref());
        let state = store.load_or_init();
        info!(
            "control plane ready (chats={}, agents={})",
            state.chats.len(),
            state.agents.len()
        );
        Self {
            store,
            state: Mutex::new(state),
            router: ProviderRouter::new(),
            prober: McpProber::new(),
            server: InferenceServerManager::new(),
            terminals: TerminalManager::new(),
            sandbox: ProjectSandbox::new(project_root.as_ref()),
        }
    }

    /// Snapshot the document plus live runtime status, restoring the
    /// active-chat invariant first.
    pub async fn bootstrap(&self) -> Bootstrap {
        let mut state = self.state.lock().await;
        state.ensure_active_chat();
        self.persist(&state);
        Bootstrap {
            state: state.clone(),
            runtime: RuntimeStatus {
                gguf: self.server.status(),
            },
        }
    }

    /// Kill the inference server and all terminal sessions.
    pub fn shutdown(&self) {
        info!("control plane shutting down");
        self.server.stop();
        self.terminals.kill_all();
    }

    /// Write the document to disk; persistence failures are logged,
    /// never propagated across the boundary.
    pub(crate) fn persist(&self, state: &AppState) {
        if let Err(err) = self.store.save(state) {
            error!("failed to persist state document: {err}");
        }
    }

    /// Current document snapshot.
    pub async fn state(&self) -> AppState {
        self.state.lock().await.clone()
    }
}
