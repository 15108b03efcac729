//! Snapshot storage backends for the headless runner.

use std::path::{Path, PathBuf};

use warbase_core::error::{EngineError, Result};
use warbase_core::interfaces::{MemoryStore, SnapshotStore};

/// Snapshot kept in a file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileStore {
    fn save(&mut self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, bytes)?;
        tracing::info!(path = %self.path.display(), bytes = bytes.len(), "Snapshot written");
        Ok(())
    }

    fn load(&mut self) -> Result<Vec<u8>> {
        std::fs::read(&self.path).map_err(EngineError::from)
    }
}

/// File-backed when a path was given, in memory otherwise.
#[derive(Debug, Clone)]
pub enum Store {
    /// On disk.
    File(FileStore),
    /// Kept for the process lifetime only.
    Memory(MemoryStore),
}

impl Store {
    /// Pick a backend for an optional path.
    #[must_use]
    pub fn for_path(path: Option<&Path>) -> Self {
        path.map_or_else(|| Self::Memory(MemoryStore::default()), |p| Self::File(FileStore::new(p)))
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::Memory(MemoryStore::default())
    }
}

impl SnapshotStore for Store {
    fn save(&mut self, bytes: &[u8]) -> Result<()> {
        match self {
            Self::File(store) => store.save(bytes),
            Self::Memory(store) => store.save(bytes),
        }
    }

    fn load(&mut self) -> Result<Vec<u8>> {
        match self {
            Self::File(store) => store.load(),
            Self::Memory(store) => store.load(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("saves").join("game.wbs"));
        store.save(b"WBSN-data").unwrap();
        assert_eq!(store.load().unwrap(), b"WBSN-data");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::for_path(Some(&dir.path().join("absent.wbs")));
        assert!(matches!(store.load(), Err(EngineError::Io(_))));
    }

    #[test]
    fn test_memory_store_without_path() {
        let mut store = Store::for_path(None);
        assert!(store.load().is_err());
        store.save(&[1, 2, 3]).unwrap();
        assert_eq!(store.load().unwrap(), vec![1, 2, 3]);
    }
}
