//! Sandboxed explorer operations over the project root.

use crate::error::SandboxError;
use crate::paths::ProjectSandbox;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Housekeeping directories excluded from every listing.
pub const IGNORED_DIRS: &[&str] = &["node_modules", ".git", "dist"];

/// Default listing depth.
const DEFAULT_MAX_DEPTH: usize = 4;

/// Kind of a tree entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One node of the explorer tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileNode>>,
}

impl ProjectSandbox {
    /// List the tree under a relative path, directories first.
    pub fn tree(&self, relative: &str, max_depth: Option<usize>) -> Result<FileNode, SandboxError> {
        let abs = self.resolve(relative)?;
        let max_depth = max_depth.unwrap_or(DEFAULT_MAX_DEPTH);
        debug!("listing tree (max_depth={})", max_depth);
        self.list_node(&abs, 0, max_depth)
    }

    fn list_node(&self, abs: &Path, depth: usize, max_depth: usize) -> Result<FileNode, SandboxError> {
        let metadata = fs::metadata(abs)?;
        let name = if depth == 0 {
            self.root()
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default()
        } else {
            abs.file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default()
        };

        if !metadata.is_dir() {
            return Ok(FileNode {
                name: abs
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_default(),
                path: self.relative_display(abs),
                kind: EntryKind::File,
                children: None,
            });
        }

        let mut entries: Vec<(String, bool)> = Vec::new();
        for entry in fs::read_dir(abs)? {
            let entry = entry?;
            let entry_name = entry.file_name().to_string_lossy().to_string();
            if IGNORED_DIRS.contains(&entry_name.as_str()) {
                continue;
            }
            let is_dir = entry.file_type()?.is_dir();
            entries.push((entry_name, is_dir));
        }
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let children = if depth >= max_depth {
            Vec::new()
        } else {
            entries
                .iter()
                .map(|(entry_name, _)| self.list_node(&abs.join(entry_name), depth + 1, max_depth))
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(FileNode {
            name,
            path: self.relative_display(abs),
            kind: EntryKind::Directory,
            children: Some(children),
        })
    }

    /// Read a file's contents as UTF-8 text.
    pub fn read_file(&self, relative: &str) -> Result<String, SandboxError> {
        let abs = self.resolve(relative)?;
        let metadata = fs::metadata(&abs)?;
        if !metadata.is_file() {
            return Err(SandboxError::NotAFile(self.relative_display(&abs)));
        }
        Ok(fs::read_to_string(&abs)?)
    }

    /// Write a file, creating parent directories as needed.
    pub fn write_file(&self, relative: &str, content: &str) -> Result<String, SandboxError> {
        let abs = self.resolve(relative)?;
        if let Some(parent) = abs.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&abs, content)?;
        info!("wrote file (bytes={})", content.len());
        Ok(self.relative_display(&abs))
    }

    /// Create an empty file if it does not already exist.
    pub fn create_file(&self, relative: &str) -> Result<String, SandboxError> {
        let abs = self.resolve(relative)?;
        if let Some(parent) = abs.parent() {
            fs::create_dir_all(parent)?;
        }
        if !abs.exists() {
            fs::write(&abs, "")?;
        }
        Ok(self.relative_display(&abs))
    }

    /// Create a directory, including missing parents.
    pub fn create_folder(&self, relative: &str) -> Result<String, SandboxError> {
        let abs = self.resolve(relative)?;
        fs::create_dir_all(&abs)?;
        Ok(self.relative_display(&abs))
    }

    /// Rename or move an entry; both endpoints are validated.
    pub fn rename(&self, old_relative: &str, new_relative: &str) -> Result<(String, String), SandboxError> {
        let old_abs = self.resolve(old_relative)?;
        let new_abs = self.resolve(new_relative)?;
        if let Some(parent) = new_abs.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&old_abs, &new_abs)?;
        info!("renamed entry");
        Ok((self.relative_display(&old_abs), self.relative_display(&new_abs)))
    }

    /// Delete a file or directory tree; missing targets are not an error.
    pub fn delete(&self, relative: &str) -> Result<String, SandboxError> {
        let abs = self.resolve(relative)?;
        match fs::metadata(&abs) {
            Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(&abs)?,
            Ok(_) => fs::remove_file(&abs)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        info!("deleted entry");
        Ok(self.relative_display(&abs))
    }
}

#[cfg(test)]
mod tests {
    use super::EntryKind;
    use crate::error::SandboxError;
    use crate::paths::ProjectSandbox;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn sandbox_for(temp: &tempfile::TempDir) -> ProjectSandbox {
        ProjectSandbox::new(temp.path())
    }

    #[test]
    fn tree_orders_directories_first() {
        let temp = tempdir().expect("tempdir");
        std::fs::write(temp.path().join("a.txt"), "a").expect("write");
        std::fs::create_dir(temp.path().join("zdir")).expect("mkdir");
        let sandbox = sandbox_for(&temp);

        let tree = sandbox.tree(".", None).expect("tree");
        let children = tree.children.expect("children");
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].name, "zdir".to_string());
        assert_eq!(children[0].kind, EntryKind::Directory);
        assert_eq!(children[1].name, "a.txt".to_string());
    }

    #[test]
    fn tree_excludes_ignored_directories() {
        let temp = tempdir().expect("tempdir");
        std::fs::create_dir(temp.path().join("node_modules")).expect("mkdir");
        std::fs::create_dir(temp.path().join(".git")).expect("mkdir");
        std::fs::create_dir(temp.path().join("src")).expect("mkdir");
        std::fs::create_dir(temp.path().join("src/dist")).expect("mkdir");
        std::fs::write(temp.path().join("src/lib.rs"), "").expect("write");
        let sandbox = sandbox_for(&temp);

        let tree = sandbox.tree(".", None).expect("tree");
        let children = tree.children.expect("children");
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "src".to_string());
        // Nested ignored directories are excluded at any depth.
        let nested = children[0].children.as_ref().expect("nested");
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].name, "lib.rs".to_string());
    }

    #[test]
    fn tree_stops_at_max_depth() {
        let temp = tempdir().expect("tempdir");
        std::fs::create_dir_all(temp.path().join("a/b/c")).expect("mkdir");
        let sandbox = sandbox_for(&temp);

        let tree = sandbox.tree(".", Some(1)).expect("tree");
        let children = tree.children.expect("children");
        assert_eq!(children[0].name, "a".to_string());
        assert_eq!(children[0].children, Some(Vec::new()));
    }

    #[test]
    fn write_then_read_round_trips() {
        let temp = tempdir().expect("tempdir");
        let sandbox = sandbox_for(&temp);

        sandbox.write_file("notes/todo.txt", "remember").expect("write");
        let content = sandbox.read_file("notes/todo.txt").expect("read");
        assert_eq!(content, "remember".to_string());
    }

    #[test]
    fn read_rejects_directories() {
        let temp = tempdir().expect("tempdir");
        std::fs::create_dir(temp.path().join("dir")).expect("mkdir");
        let sandbox = sandbox_for(&temp);

        let err = sandbox.read_file("dir").expect_err("not a file");
        assert!(matches!(err, SandboxError::NotAFile(_)));
    }

    #[test]
    fn create_file_preserves_existing_content() {
        let temp = tempdir().expect("tempdir");
        let sandbox = sandbox_for(&temp);
        sandbox.write_file("keep.txt", "data").expect("write");

        sandbox.create_file("keep.txt").expect("create");
        assert_eq!(sandbox.read_file("keep.txt").expect("read"), "data".to_string());
    }

    #[test]
    fn rename_validates_both_endpoints() {
        let temp = tempdir().expect("tempdir");
        let sandbox = sandbox_for(&temp);
        sandbox.write_file("old.txt", "x").expect("write");

        let err = sandbox.rename("old.txt", "../outside.txt").expect_err("escape");
        assert!(matches!(err, SandboxError::PathEscape));
        // The source is untouched after a rejected rename.
        assert_eq!(sandbox.read_file("old.txt").expect("read"), "x".to_string());

        let (old, new) = sandbox.rename("old.txt", "sub/new.txt").expect("rename");
        assert_eq!(old, "old.txt".to_string());
        assert_eq!(new, "sub/new.txt".to_string());
    }

    #[test]
    fn delete_removes_directories_and_tolerates_missing() {
        let temp = tempdir().expect("tempdir");
        let sandbox = sandbox_for(&temp);
        sandbox.write_file("dir/file.txt", "x").expect("write");

        sandbox.delete("dir").expect("delete");
        assert_eq!(temp.path().join("dir").exists(), false);
        sandbox.delete("dir").expect("delete missing");
    }

    #[test]
    fn every_operation_rejects_escapes() {
        let temp = tempdir().expect("tempdir");
        let sandbox = sandbox_for(&temp);

        assert!(matches!(sandbox.tree("..", None), Err(SandboxError::PathEscape)));
        assert!(matches!(sandbox.read_file("../x"), Err(SandboxError::PathEscape)));
        assert!(matches!(sandbox.write_file("../x", ""), Err(SandboxError::PathEscape)));
        assert!(matches!(sandbox.create_file("../x"), Err(SandboxError::PathEscape)));
        assert!(matches!(sandbox.create_folder("../x"), Err(SandboxError::PathEscape)));
        assert!(matches!(sandbox.delete("../x"), Err(SandboxError::PathEscape)));
    }
}
