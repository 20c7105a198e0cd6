//! Local inference server lifecycle.
//!
//! Wraps a llama.cpp style server binary behind a tagged state so a
//! pid can never outlive the process it referred to. A background
//! waiter clears the state when the child exits on its own; the
//! generation counter keeps a stale waiter from clobbering a newer
//! start.

use crate::error::ProcessError;
use crate::runner::{ProcessEvent, ProcessHandle};
use deskpilot_config::GgufSettings;
use log::{info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// Snapshot of the server's state for callers.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    pub running: bool,
    pub pid: Option<u32>,
    pub endpoint: Option<String>,
}

/// Result of a start request.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StartOutcome {
    /// False when the server was already running and no spawn happened.
    pub started: bool,
    pub message: String,
    pub pid: Option<u32>,
}

enum ServerState {
    Stopped,
    Running {
        handle: ProcessHandle,
        endpoint: String,
    },
}

struct Inner {
    state: ServerState,
    generation: u64,
}

/// Manages at most one local inference server process.
#[derive(Clone)]
pub struct InferenceServerManager {
    inner: Arc<Mutex<Inner>>,
}

impl Default for InferenceServerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceServerManager {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: ServerState::Stopped,
                generation: 0,
            })),
        }
    }

    /// Start the server if it is not already running. Idempotent: a
    /// second start while running reports success without spawning.
    pub fn start(&self, settings: &GgufSettings) -> Result<StartOutcome, ProcessError> {
        settings.require_paths()?;

        let mut inner = self.inner.lock();
        if let ServerState::Running { handle, .. } = &inner.state {
            return Ok(StartOutcome {
                started: false,
                message: "server already running".to_string(),
                pid: handle.pid(),
            });
        }

        let args = server_args(settings);
        let mut handle = ProcessHandle::spawn_argv(&settings.binary_path, &args, None)?;
        let pid = handle.pid();
        info!("inference server started (pid={:?})", pid);

        inner.generation += 1;
        let generation = inner.generation;
        if let Some(mut events) = handle.take_events() {
            let shared = Arc::clone(&self.inner);
            tokio::spawn(async move {
                while let Some(event) = events.recv().await {
                    if let ProcessEvent::Exited(code) = event {
                        let mut inner = shared.lock();
                        if inner.generation == generation {
                            if !matches!(inner.state, ServerState::Stopped) {
                                warn!("inference server exited (code={:?})", code);
                            }
                            inner.state = ServerState::Stopped;
                        }
                        break;
                    }
                }
            });
        }

        inner.state = ServerState::Running {
            handle,
            endpoint: settings.endpoint(),
        };
        Ok(StartOutcome {
            started: true,
            message: "server starting".to_string(),
            pid,
        })
    }

    /// Kill the server if running. The state flips to stopped
    /// immediately rather than waiting for the process to die.
    pub fn stop(&self) -> bool {
        let mut inner = self.inner.lock();
        match std::mem::replace(&mut inner.state, ServerState::Stopped) {
            ServerState::Running { handle, .. } => {
                info!("stopping inference server (pid={:?})", handle.pid());
                handle.kill();
                true
            }
            ServerState::Stopped => false,
        }
    }

    pub fn status(&self) -> ServerStatus {
        let inner = self.inner.lock();
        match &inner.state {
            ServerState::Running { handle, endpoint } => ServerStatus {
                running: true,
                pid: handle.pid(),
                endpoint: Some(endpoint.clone()),
            },
            ServerState::Stopped => ServerStatus {
                running: false,
                pid: None,
                endpoint: None,
            },
        }
    }
}

/// Argument list for the server binary.
fn server_args(settings: &GgufSettings) -> Vec<String> {
    let mut args = vec![
        "--model".to_string(),
        settings.model_path.clone(),
        "--host".to_string(),
        settings.host.clone(),
        "--port".to_string(),
        settings.port.to_string(),
        "--ctx-size".to_string(),
        settings.ctx_size.to_string(),
        "--alias".to_string(),
        settings.model_alias.clone(),
    ];
    if settings.gpu_layers > 0 {
        args.push("--n-gpu-layers".to_string());
        args.push(settings.gpu_layers.to_string());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::{server_args, InferenceServerManager};
    use deskpilot_config::GgufSettings;
    use pretty_assertions::assert_eq;

    fn settings(binary: &str, model: &str) -> GgufSettings {
        GgufSettings {
            binary_path: binary.to_string(),
            model_path: model.to_string(),
            ..GgufSettings::default()
        }
    }

    #[test]
    fn args_follow_llama_server_conventions() {
        let mut cfg = settings("/usr/bin/llama-server", "/models/m.gguf");
        cfg.port = 9090;
        cfg.ctx_size = 4096;
        let args = server_args(&cfg);
        assert_eq!(
            args,
            vec![
                "--model",
                "/models/m.gguf",
                "--host",
                "127.0.0.1",
                "--port",
                "9090",
                "--ctx-size",
                "4096",
                "--alias",
                "gguf-local-model",
            ]
        );
    }

    #[test]
    fn gpu_layers_flag_appears_only_when_positive() {
        let mut cfg = settings("/usr/bin/llama-server", "/models/m.gguf");
        cfg.gpu_layers = 35;
        let args = server_args(&cfg);
        assert_eq!(args[args.len() - 2], "--n-gpu-layers".to_string());
        assert_eq!(args[args.len() - 1], "35".to_string());
    }

    #[tokio::test]
    async fn start_rejects_missing_paths() {
        let manager = InferenceServerManager::new();
        let result = manager.start(&GgufSettings::default());
        assert_eq!(result.is_err(), true);
    }

    #[cfg(unix)]
    mod unix {
        use super::super::InferenceServerManager;
        use deskpilot_config::GgufSettings;
        use pretty_assertions::assert_eq;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::tempdir;

        /// A stand-in binary that ignores its flags and blocks.
        fn fake_server(dir: &std::path::Path) -> String {
            let path = dir.join("fake-server");
            std::fs::write(&path, "#!/bin/sh\nsleep 30\n").expect("write script");
            let mut perms = std::fs::metadata(&path).expect("metadata").permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&path, perms).expect("chmod");
            path.to_string_lossy().to_string()
        }

        #[tokio::test]
        async fn second_start_is_idempotent() {
            let dir = tempdir().expect("tempdir");
            let model = dir.path().join("m.gguf");
            std::fs::write(&model, b"").expect("touch model");
            let cfg = GgufSettings {
                binary_path: fake_server(dir.path()),
                model_path: model.to_string_lossy().to_string(),
                ..GgufSettings::default()
            };

            let manager = InferenceServerManager::new();
            let first = manager.start(&cfg).expect("first start");
            assert_eq!(first.started, true);
            let pid = first.pid;

            let second = manager.start(&cfg).expect("second start");
            assert_eq!(second.started, false);
            assert_eq!(second.pid, pid);

            let status = manager.status();
            assert_eq!(status.running, true);
            assert_eq!(status.endpoint, Some("http://127.0.0.1:8080/v1".to_string()));

            assert_eq!(manager.stop(), true);
            assert_eq!(manager.status().running, false);
            assert_eq!(manager.stop(), false);
        }
    }
}
