//! Persisted container identity
//!
//! One plain-text file per container task holding the id of the most
//! recently created container. It is read once at the start of the next
//! invocation to decide whether the running container is still the one this
//! task created, and overwritten after every successful creation.

use crate::error::Result;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Backing file for one task's persisted container id
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Conventional location for a named task under a state directory
    pub fn for_task(state_dir: &Path, task_name: &str) -> Self {
        Self::new(state_dir.join("containers").join(task_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The previously persisted id, or `None` on the first run
    pub fn load(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents.trim_end().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite the persisted id, creating parent directories as needed
    pub fn store(&self, container_id: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, container_id)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_absent_file_is_none() {
        let temp = tempdir().unwrap();
        let state = StateFile::new(temp.path().join("mysql"));
        assert_eq!(state.load().unwrap(), None);
    }

    #[test]
    fn test_store_then_load_round_trip() {
        let temp = tempdir().unwrap();
        let state = StateFile::for_task(temp.path(), "mysql");

        state.store("abc123").unwrap();
        assert_eq!(state.load().unwrap().as_deref(), Some("abc123"));
    }

    #[test]
    fn test_store_creates_parent_directories() {
        let temp = tempdir().unwrap();
        let state = StateFile::for_task(&temp.path().join("deeply").join("nested"), "db");

        state.store("id-1").unwrap();
        assert!(state.path().exists());
    }

    #[test]
    fn test_load_trims_trailing_newline() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("mysql");
        std::fs::write(&path, "abc123\n").unwrap();

        let state = StateFile::new(path);
        assert_eq!(state.load().unwrap().as_deref(), Some("abc123"));
    }
}
