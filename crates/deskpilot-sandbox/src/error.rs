//! Sandbox error types.

/// Errors returned by sandboxed filesystem operations.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// Resolved path leaves the project root.
    #[error("path escapes project root")]
    PathEscape,
    /// Target exists but has the wrong kind.
    #[error("not a file: {0}")]
    NotAFile(String),
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
