//! Snapshot persistence
//!
//! Stores serialize their full cache after every successful refresh and
//! reload it on startup, so a restart begins from last-known intel
//! instead of the bundled seed. Keys carry the schema version; bumping
//! the version orphans old files rather than misreading them.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::models::{AppError, AppResult, ErrorCode};

/// Where snapshots live. `load` returning `Ok(None)` means "nothing
/// persisted yet", which is not an error.
pub trait SnapshotStore: Send + Sync {
    fn load(&self, key: &str) -> AppResult<Option<String>>;
    fn save(&self, key: &str, json: &str) -> AppResult<()>;
}

// ============================================
// FILE-BACKED STORE
// ============================================

/// One JSON file per key under a data directory
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let _ = fs::create_dir_all(&dir);
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self, key: &str) -> AppResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::with_source(
                ErrorCode::PersistReadFailed,
                format!("Failed to read snapshot '{}'", key),
                e,
            )),
        }
    }

    fn save(&self, key: &str, json: &str) -> AppResult<()> {
        // Write to a sibling temp file first so a crash mid-write never
        // leaves a truncated snapshot behind
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{}.json.tmp", key));
        fs::write(&tmp, json).map_err(|e| {
            AppError::with_source(
                ErrorCode::PersistWriteFailed,
                format!("Failed to write snapshot '{}'", key),
                e,
            )
        })?;
        fs::rename(&tmp, &path).map_err(|e| {
            AppError::with_source(
                ErrorCode::PersistWriteFailed,
                format!("Failed to commit snapshot '{}'", key),
                e,
            )
        })
    }
}

// ============================================
// IN-MEMORY STORE
// ============================================

/// Map-backed store for tests and `--offline` runs. Clones share the
/// same underlying map, matching how both intel stores share one data
/// directory in the file-backed case.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn save(&self, key: &str, json: &str) -> AppResult<()> {
        self.entries.lock().insert(key.to_string(), json.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemorySnapshotStore::new();
        assert_eq!(store.load("x").unwrap(), None);
        store.save("x", "{\"a\":1}").unwrap();
        assert_eq!(store.load("x").unwrap().as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_memory_store_clones_share_state() {
        let store = MemorySnapshotStore::new();
        let other = store.clone();
        store.save("k", "v").unwrap();
        assert_eq!(other.load("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!(
            "sentry-persist-test-{}",
            std::process::id()
        ));
        let store = FileSnapshotStore::new(&dir);
        assert_eq!(store.load("snap").unwrap(), None);
        store.save("snap", "{\"v\":1}").unwrap();
        assert_eq!(store.load("snap").unwrap().as_deref(), Some("{\"v\":1}"));
        let _ = fs::remove_dir_all(&dir);
    }
}
