//! Channel-based subprocess runner.
//!
//! A spawned child is serviced by owned tasks: one reader per output
//! stream, one writer for stdin, and a waiter that observes exit. All
//! output and the final exit notification arrive on a single event
//! channel, with the exit event guaranteed to be delivered last.

use crate::error::ProcessError;
use log::{debug, warn};
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

/// Read chunk size for child output streams.
const READ_CHUNK_BYTES: usize = 8192;

/// Event emitted by a running child process.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    /// A chunk of standard output.
    Stdout(String),
    /// A chunk of standard error.
    Stderr(String),
    /// The process exited; `None` means killed by signal.
    Exited(Option<i32>),
}

/// Handle to a spawned child process.
///
/// Dropping the handle does not kill the child; owners call [`kill`]
/// (or drain the event stream to the exit event) as part of teardown.
///
/// [`kill`]: ProcessHandle::kill
#[derive(Debug)]
pub struct ProcessHandle {
    pid: Option<u32>,
    stdin_tx: mpsc::UnboundedSender<String>,
    kill_tx: mpsc::UnboundedSender<()>,
    events: Option<mpsc::UnboundedReceiver<ProcessEvent>>,
}

impl ProcessHandle {
    /// Spawn a command argv-style, with no shell interpretation.
    pub fn spawn_argv(
        command: &str,
        args: &[String],
        cwd: Option<&Path>,
    ) -> Result<Self, ProcessError> {
        let mut cmd = Command::new(command);
        cmd.args(args);
        if let Some(cwd) = cwd {
            cmd.current_dir(cwd);
        }
        debug!("spawning process (args_len={})", args.len());
        Self::spawn(cmd)
    }

    /// Spawn a single command string interpreted by the OS shell.
    pub fn spawn_shell(command: &str, cwd: Option<&Path>) -> Result<Self, ProcessError> {
        let mut cmd = shell_command(command);
        if let Some(cwd) = cwd {
            cmd.current_dir(cwd);
        }
        debug!("spawning shell command (len={})", command.len());
        Self::spawn(cmd)
    }

    fn spawn(mut cmd: Command) -> Result<Self, ProcessError> {
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = cmd.spawn().map_err(ProcessError::Spawn)?;
        let pid = child.id();

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (stdin_tx, stdin_rx) = mpsc::unbounded_channel::<String>();
        let (kill_tx, kill_rx) = mpsc::unbounded_channel::<()>();

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdin = child.stdin.take();

        if let Some(mut stdin) = stdin {
            let mut stdin_rx = stdin_rx;
            tokio::spawn(async move {
                while let Some(input) = stdin_rx.recv().await {
                    if stdin.write_all(input.as_bytes()).await.is_err() {
                        break;
                    }
                    if stdin.flush().await.is_err() {
                        break;
                    }
                }
            });
        }

        let stdout_task = stdout.map(|reader| {
            let tx = events_tx.clone();
            tokio::spawn(read_stream(reader, tx, true))
        });
        let stderr_task = stderr.map(|reader| {
            let tx = events_tx.clone();
            tokio::spawn(read_stream(reader, tx, false))
        });

        tokio::spawn(wait_for_exit(
            child, kill_rx, stdout_task, stderr_task, events_tx,
        ));

        Ok(Self {
            pid,
            stdin_tx,
            kill_tx,
            events: Some(events_rx),
        })
    }

    /// OS process id, if still known.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Queue bytes for the child's stdin; false once the writer is gone.
    pub fn write(&self, input: impl Into<String>) -> bool {
        self.stdin_tx.send(input.into()).is_ok()
    }

    /// Ask the waiter to terminate the child.
    pub fn kill(&self) {
        if self.kill_tx.send(()).is_err() {
            debug!("kill requested after process exit");
        }
    }

    /// Take the event receiver; yields `None` after the first call.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<ProcessEvent>> {
        self.events.take()
    }
}

/// Read one output stream in chunks, forwarding each as an event.
async fn read_stream<R>(mut reader: R, tx: mpsc::UnboundedSender<ProcessEvent>, is_stdout: bool)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; READ_CHUNK_BYTES];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(read) => {
                let text = String::from_utf8_lossy(&chunk[..read]).to_string();
                let event = if is_stdout {
                    ProcessEvent::Stdout(text)
                } else {
                    ProcessEvent::Stderr(text)
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
        }
    }
}

/// Wait for the child to exit, honoring kill requests, then emit the
/// exit event after both readers have drained.
async fn wait_for_exit(
    mut child: Child,
    mut kill_rx: mpsc::UnboundedReceiver<()>,
    stdout_task: Option<tokio::task::JoinHandle<()>>,
    stderr_task: Option<tokio::task::JoinHandle<()>>,
    events_tx: mpsc::UnboundedSender<ProcessEvent>,
) {
    let status = loop {
        tokio::select! {
            Some(()) = kill_rx.recv() => {
                if let Err(err) = child.start_kill() {
                    warn!("failed to kill process: {err}");
                }
            }
            status = child.wait() => break status,
        }
    };

    if let Some(task) = stdout_task {
        let _ = task.await;
    }
    if let Some(task) = stderr_task {
        let _ = task.await;
    }

    let code = match status {
        Ok(status) => status.code(),
        Err(err) => {
            warn!("failed to reap process: {err}");
            None
        }
    };
    let _ = events_tx.send(ProcessEvent::Exited(code));
}

/// Build a command that runs a string through the platform shell.
fn shell_command(command: &str) -> Command {
    #[cfg(unix)]
    {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    }
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    }
}
