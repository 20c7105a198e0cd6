//! Lexical path resolution against a fixed project root.

use crate::error::SandboxError;
use std::path::{Component, Path, PathBuf};

/// Resolves relative paths against a project root and rejects escapes.
///
/// Resolution is lexical: `.` and `..` components are folded without
/// touching the filesystem, then the result must equal the root or sit
/// under `root + separator`. Symlinks are not chased.
#[derive(Debug, Clone)]
pub struct ProjectSandbox {
    root: PathBuf,
}

impl ProjectSandbox {
    /// Create a sandbox rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: normalize_path(&root.into()),
        }
    }

    /// The sandbox root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative path inside the root; empty input means the root.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, SandboxError> {
        let input = if relative.trim().is_empty() {
            "."
        } else {
            relative
        };
        let resolved = normalize_path(&self.root.join(input));
        if resolved == self.root || resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            Err(SandboxError::PathEscape)
        }
    }

    /// Format a resolved path relative to the root, with forward slashes.
    pub fn relative_display(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

/// Fold path components without resolving symlinks.
fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::RootDir => normalized.push(Path::new("/")),
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(part) => normalized.push(part),
        }
    }
    normalized
}
