//! Path-sandboxed filesystem access for the project root.
//!
//! Every explorer operation resolves its path through [`ProjectSandbox`]
//! before touching the filesystem; resolution is purely lexical, so a
//! path escaping the root is rejected without consulting the disk.

pub mod error;
pub mod explorer;
pub mod paths;

/// Sandbox error type.
pub use error::SandboxError;
/// Explorer operations and the directory tree node.
pub use explorer::{EntryKind, FileNode, IGNORED_DIRS};
/// Lexical path sandbox.
pub use paths::ProjectSandbox;
