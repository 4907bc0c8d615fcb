//! Staging changes in the catalog's git index.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::StoreError;

/// The index operations the pipeline needs.
pub trait VersionControl {
    /// Stage new or modified files.
    fn add(&self, paths: &[PathBuf]) -> Result<(), StoreError>;

    /// Stage deletions of files already removed from the working tree.
    /// Paths the index does not track are ignored.
    fn remove(&self, paths: &[PathBuf]) -> Result<(), StoreError>;
}

/// The `git` binary, run inside a work tree.
#[derive(Debug, Clone)]
pub struct Git {
    work_tree: PathBuf,
}

impl Git {
    pub fn new(work_tree: &Path) -> Self {
        Self {
            work_tree: work_tree.to_path_buf(),
        }
    }

    fn run(&self, args: &[&str], paths: &[PathBuf]) -> Result<(), StoreError> {
        if paths.is_empty() {
            return Ok(());
        }
        // Paths are relative to the current directory, not the work tree.
        let absolute = paths
            .iter()
            .map(|path| std::path::absolute(path).map_err(StoreError::io(path)))
            .collect::<Result<Vec<_>, _>>()?;
        let command = format!("git {}", args.join(" "));
        debug!(command = %command, count = paths.len(), "staging");
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.work_tree)
            .args(args)
            .arg("--")
            .args(&absolute)
            .output()
            .map_err(|source| StoreError::Spawn {
                program: "git".to_string(),
                source,
            })?;
        if !output.status.success() {
            return Err(StoreError::Tool {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl VersionControl for Git {
    fn add(&self, paths: &[PathBuf]) -> Result<(), StoreError> {
        self.run(&["add"], paths)
    }

    fn remove(&self, paths: &[PathBuf]) -> Result<(), StoreError> {
        self.run(&["rm", "--cached", "--quiet", "--ignore-unmatch"], paths)
    }
}
