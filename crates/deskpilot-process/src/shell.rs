//! One-shot shell command execution.

use crate::error::ProcessError;
use log::debug;
use serde::Serialize;
use std::path::Path;
use tokio::process::Command;

/// Outcome of a completed shell command.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ShellOutput {
    pub ok: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Run a command through the platform shell and capture its output.
///
/// Non-zero exit is not an error; it is reported via `ok` and `code`.
pub async fn run_shell_command(command: &str, cwd: &Path) -> Result<ShellOutput, ProcessError> {
    debug!("running shell command (len={})", command.len());
    let output = shell(command).current_dir(cwd).output().await?;
    Ok(ShellOutput {
        ok: output.status.success(),
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

fn shell(command: &str) -> Command {
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

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::run_shell_command;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let dir = tempdir().expect("tempdir");
        let out = run_shell_command("printf hello", dir.path())
            .await
            .expect("run");
        assert_eq!(out.ok, true);
        assert_eq!(out.code, Some(0));
        assert_eq!(out.stdout, "hello".to_string());
        assert_eq!(out.stderr, "".to_string());
    }

    #[tokio::test]
    async fn non_zero_exit_is_reported_not_raised() {
        let dir = tempdir().expect("tempdir");
        let out = run_shell_command("printf oops 1>&2; exit 3", dir.path())
            .await
            .expect("run");
        assert_eq!(out.ok, false);
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stderr, "oops".to_string());
    }

    #[tokio::test]
    async fn runs_in_the_given_working_directory() {
        let dir = tempdir().expect("tempdir");
        let out = run_shell_command("pwd", dir.path()).await.expect("run");
        let reported = out.stdout.trim();
        let canonical = dir.path().canonicalize().expect("canonicalize");
        assert_eq!(reported, canonical.to_string_lossy());
    }
}
