//! Sandboxed filesystem and git boundary operations.
//!
//! Every filesystem operation funnels through the path sandbox and
//! reports `{ok:false, message}` on violation instead of raising. Git
//! commands run through the shell helper and fold spawn failures into
//! the same output shape as a nonzero exit.

use super::ControlPlane;
use deskpilot_process::{ShellOutput, run_shell_command};
use deskpilot_sandbox::FileNode;
use serde::Serialize;

/// Tree listing result.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TreeOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree: Option<FileNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// File read result; `content` is empty on failure.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReadOutcome {
    pub ok: bool,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Result for write/create/delete, reporting the normalized path.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PathOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Rename result with both normalized endpoints.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenameOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PathOutcome {
    fn from_result(result: Result<String, deskpilot_sandbox::SandboxError>) -> Self {
        match result {
            Ok(path) => Self {
                ok: true,
                path: Some(path),
                message: None,
            },
            Err(err) => Self {
                ok: false,
                path: None,
                message: Some(err.to_string()),
            },
        }
    }
}

impl ControlPlane {
    /// List the project tree below a relative path.
    pub fn tree(&self, path: Option<&str>, max_depth: Option<usize>) -> TreeOutcome {
        match self.sandbox.tree(path.unwrap_or("."), max_depth) {
            Ok(tree) => TreeOutcome {
                ok: true,
                tree: Some(tree),
                message: None,
            },
            Err(err) => TreeOutcome {
                ok: false,
                tree: None,
                message: Some(err.to_string()),
            },
        }
    }

    pub fn read_file(&self, path: &str) -> ReadOutcome {
        match self.sandbox.read_file(path) {
            Ok(content) => ReadOutcome {
                ok: true,
                content,
                message: None,
            },
            Err(err) => ReadOutcome {
                ok: false,
                content: String::new(),
                message: Some(err.to_string()),
            },
        }
    }

    pub fn write_file(&self, path: &str, content: &str) -> PathOutcome {
        PathOutcome::from_result(self.sandbox.write_file(path, content))
    }

    pub fn create_file(&self, path: &str) -> PathOutcome {
        PathOutcome::from_result(self.sandbox.create_file(path))
    }

    pub fn create_folder(&self, path: &str) -> PathOutcome {
        PathOutcome::from_result(self.sandbox.create_folder(path))
    }

    pub fn rename(&self, old_path: &str, new_path: &str) -> RenameOutcome {
        match self.sandbox.rename(old_path, new_path) {
            Ok((old_path, new_path)) => RenameOutcome {
                ok: true,
                old_path: Some(old_path),
                new_path: Some(new_path),
                message: None,
            },
            Err(err) => RenameOutcome {
                ok: false,
                old_path: None,
                new_path: None,
                message: Some(err.to_string()),
            },
        }
    }

    pub fn delete(&self, path: &str) -> PathOutcome {
        PathOutcome::from_result(self.sandbox.delete(path))
    }

    pub async fn git_status(&self) -> ShellOutput {
        self.shell("git status --short --branch").await
    }

    pub async fn git_branches(&self) -> ShellOutput {
        self.shell("git branch --all").await
    }

    pub async fn git_worktree_list(&self) -> ShellOutput {
        self.shell("git worktree list").await
    }

    pub async fn git_worktree_add(&self, path: &str, branch: &str) -> ShellOutput {
        self.shell(&format!("git worktree add {path} {branch}")).await
    }

    pub async fn git_worktree_remove(&self, path: &str) -> ShellOutput {
        self.shell(&format!("git worktree remove {path} --force")).await
    }

    /// Run a shell command at the project root, folding spawn failures
    /// into the output shape.
    pub(crate) async fn shell(&self, command: &str) -> ShellOutput {
        match run_shell_command(command, self.sandbox.root()).await {
            Ok(output) => output,
            Err(err) => ShellOutput {
                ok: false,
                code: None,
                stdout: String::new(),
                stderr: err.to_string(),
            },
        }
    }
}
