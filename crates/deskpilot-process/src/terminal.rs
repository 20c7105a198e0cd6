//! Interactive terminal sessions.
//!
//! Each session wraps a shell process whose output is accumulated in a
//! tail-capped buffer. Callers poll to drain the buffer; polling is
//! destructive, so each chunk of output is delivered exactly once.

use crate::error::ProcessError;
use crate::runner::{ProcessEvent, ProcessHandle};
use log::{debug, info};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Maximum bytes of unread output retained per session.
const OUTPUT_TAIL_BYTES: usize = 64_000;

const DEFAULT_SHELL: &str = "bash";

/// Drained output plus session liveness.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PollResult {
    pub ok: bool,
    pub output: String,
    pub closed: bool,
    pub exit_code: Option<i32>,
}

#[derive(Default)]
struct Buffer {
    output: String,
    closed: bool,
    exit_code: Option<i32>,
}

impl Buffer {
    fn append(&mut self, chunk: &str) {
        self.output.push_str(chunk);
        if self.output.len() > OUTPUT_TAIL_BYTES {
            let mut cut = self.output.len() - OUTPUT_TAIL_BYTES;
            while !self.output.is_char_boundary(cut) {
                cut += 1;
            }
            self.output = self.output.split_off(cut);
        }
    }
}

struct Session {
    handle: ProcessHandle,
    buffer: Arc<Mutex<Buffer>>,
}

/// Registry of live terminal sessions.
#[derive(Clone, Default)]
pub struct TerminalManager {
    sessions: Arc<Mutex<HashMap<Uuid, Session>>>,
}

impl TerminalManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a session running `command` (or an interactive shell) and
    /// return its id.
    pub fn start(
        &self,
        command: Option<&str>,
        cwd: Option<&Path>,
    ) -> Result<Uuid, ProcessError> {
        let command = command.unwrap_or(DEFAULT_SHELL);
        let mut handle = ProcessHandle::spawn_shell(command, cwd)?;
        let id = Uuid::new_v4();
        info!("terminal session started (id={id})");

        let buffer = Arc::new(Mutex::new(Buffer::default()));
        if let Some(mut events) = handle.take_events() {
            let buffer = Arc::clone(&buffer);
            tokio::spawn(async move {
                while let Some(event) = events.recv().await {
                    match event {
                        ProcessEvent::Stdout(chunk) | ProcessEvent::Stderr(chunk) => {
                            buffer.lock().append(&chunk);
                        }
                        ProcessEvent::Exited(code) => {
                            let mut buffer = buffer.lock();
                            let rendered = match code {
                                Some(code) => code.to_string(),
                                None => "null".to_string(),
                            };
                            buffer
                                .append(&format!("\n[process exited with code {rendered}]\n"));
                            buffer.closed = true;
                            buffer.exit_code = code;
                            break;
                        }
                    }
                }
            });
        }

        self.sessions.lock().insert(id, Session { handle, buffer });
        Ok(id)
    }

    /// Send input to a session's stdin; false if absent or closed.
    pub fn write(&self, id: Uuid, input: &str) -> bool {
        let sessions = self.sessions.lock();
        let Some(session) = sessions.get(&id) else {
            return false;
        };
        if session.buffer.lock().closed {
            return false;
        }
        session.handle.write(input)
    }

    /// Drain accumulated output. An unknown id reports a closed
    /// session rather than an error.
    pub fn poll(&self, id: Uuid) -> PollResult {
        let sessions = self.sessions.lock();
        let Some(session) = sessions.get(&id) else {
            return PollResult {
                ok: false,
                output: String::new(),
                closed: true,
                exit_code: None,
            };
        };
        let mut buffer = session.buffer.lock();
        PollResult {
            ok: true,
            output: std::mem::take(&mut buffer.output),
            closed: buffer.closed,
            exit_code: buffer.exit_code,
        }
    }

    /// Kill a session's process; the session stays pollable until the
    /// exit marker has been drained.
    pub fn stop(&self, id: Uuid) -> bool {
        let sessions = self.sessions.lock();
        match sessions.get(&id) {
            Some(session) => {
                debug!("stopping terminal session (id={id})");
                session.handle.kill();
                true
            }
            None => false,
        }
    }

    /// Remove a session from the registry entirely.
    pub fn remove(&self, id: Uuid) -> bool {
        match self.sessions.lock().remove(&id) {
            Some(session) => {
                session.handle.kill();
                true
            }
            None => false,
        }
    }

    /// Kill every live session. Used at shutdown.
    pub fn kill_all(&self) {
        let mut sessions = self.sessions.lock();
        for (id, session) in sessions.drain() {
            debug!("killing terminal session (id={id})");
            session.handle.kill();
        }
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::{PollResult, TerminalManager};
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use uuid::Uuid;

    async fn poll_until_closed(manager: &TerminalManager, id: Uuid) -> (String, Option<i32>) {
        let mut combined = String::new();
        for _ in 0..100 {
            let result = manager.poll(id);
            combined.push_str(&result.output);
            if result.closed {
                return (combined, result.exit_code);
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("session never closed");
    }

    #[tokio::test]
    async fn exit_marker_is_appended_after_output() {
        let manager = TerminalManager::new();
        let id = manager.start(Some("printf hello; exit 7"), None).expect("start");
        let (output, exit_code) = poll_until_closed(&manager, id).await;
        assert_eq!(output, "hello\n[process exited with code 7]\n".to_string());
        assert_eq!(exit_code, Some(7));
    }

    #[tokio::test]
    async fn poll_drains_each_chunk_exactly_once() {
        let manager = TerminalManager::new();
        let id = manager.start(Some("printf once; sleep 30"), None).expect("start");

        let mut first = String::new();
        for _ in 0..100 {
            first.push_str(&manager.poll(id).output);
            if !first.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(first, "once".to_string());
        assert_eq!(manager.poll(id).output, "".to_string());
        manager.stop(id);
    }

    #[tokio::test]
    async fn write_reaches_the_shell() {
        let manager = TerminalManager::new();
        let id = manager.start(Some("cat"), None).expect("start");
        assert_eq!(manager.write(id, "ping\n"), true);
        let mut seen = String::new();
        for _ in 0..100 {
            seen.push_str(&manager.poll(id).output);
            if seen.contains("ping") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(seen, "ping\n".to_string());
        manager.stop(id);
        let (_, exit_code) = poll_until_closed(&manager, id).await;
        assert_eq!(exit_code, None);
    }

    #[tokio::test]
    async fn write_after_close_is_rejected() {
        let manager = TerminalManager::new();
        let id = manager.start(Some("true"), None).expect("start");
        poll_until_closed(&manager, id).await;
        assert_eq!(manager.write(id, "anything\n"), false);
    }

    #[tokio::test]
    async fn unknown_session_polls_as_closed() {
        let manager = TerminalManager::new();
        let result = manager.poll(Uuid::new_v4());
        assert_eq!(
            result,
            PollResult {
                ok: false,
                output: String::new(),
                closed: true,
                exit_code: None,
            }
        );
    }
}
