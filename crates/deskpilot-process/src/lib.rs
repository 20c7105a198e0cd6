//! Subprocess lifecycle management for deskpilot.
//!
//! This crate owns the process runner (channel-based stdout/stderr/exit
//! delivery), the one-shot shell command helper, the local inference
//! server manager, and the interactive terminal session manager.

pub mod error;
pub mod runner;
pub mod server;
pub mod shell;
pub mod terminal;

/// Process error type.
pub use error::ProcessError;
/// Process runner handle and its event stream.
pub use runner::{ProcessEvent, ProcessHandle};
/// Local inference server manager and status.
pub use server::{InferenceServerManager, ServerStatus, StartOutcome};
/// One-shot shell command helper.
pub use shell::{ShellOutput, run_shell_command};
/// Interactive terminal sessions.
pub use terminal::{PollResult, TerminalManager};
