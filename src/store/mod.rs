//! Persistence layer: one JSON file per table in the data directory.
//!
//! [`Storage`] is either memory-only (no data directory) or rooted in a
//! directory. A rooted storage tries to take the [`WriterLock`]; without it the
//! storage is read-only and saves return [`StoreError::ReadOnly`].
//!
//! Loads never fail: missing and corrupt files both yield the table's default,
//! see [`json::load_or_default`].

pub mod json;
pub mod lock;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{StoreError, StoreResult};

pub use json::LoadError;
pub use lock::WriterLock;

const LOCK_FILE: &str = "engine.lock";

/// Tables persisted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreFile {
    ValueTable,
    SenderPreferences,
    TagConfidence,
    RewardHistory,
    Corrections,
    RewardLedger,
}

impl StoreFile {
    pub const ALL: [StoreFile; 6] = [
        StoreFile::ValueTable,
        StoreFile::SenderPreferences,
        StoreFile::TagConfidence,
        StoreFile::RewardHistory,
        StoreFile::Corrections,
        StoreFile::RewardLedger,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Self::ValueTable => "value_table.json",
            Self::SenderPreferences => "sender_preferences.json",
            Self::TagConfidence => "tag_confidence.json",
            Self::RewardHistory => "reward_history.json",
            Self::Corrections => "corrections.json",
            Self::RewardLedger => "reward_ledger.json",
        }
    }
}

/// Where engine state lives, and whether this process may write it.
#[derive(Debug, Clone)]
pub struct Storage {
    root: Option<PathBuf>,
    lock: Option<Arc<WriterLock>>,
}

impl Storage {
    /// Memory-only storage. Loads return defaults and saves are no-ops.
    pub fn memory() -> Self {
        Self {
            root: None,
            lock: None,
        }
    }

    /// Storage rooted at `dir`, created if needed.
    ///
    /// When another process holds the writer lock, the storage opens
    /// read-only and a warning is logged.
    pub fn open(dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(dir).map_err(|e| StoreError::Io {
            path: dir.display().to_string(),
            source: e,
        })?;

        let lock = WriterLock::try_acquire(&dir.join(LOCK_FILE))?;
        if lock.is_none() {
            tracing::warn!(
                data_dir = %dir.display(),
                "data directory locked by another process, opening read-only"
            );
        }

        Ok(Self {
            root: Some(dir.to_path_buf()),
            lock: lock.map(Arc::new),
        })
    }

    /// Rooted storage that must be writable.
    pub fn open_exclusive(dir: &Path) -> StoreResult<Self> {
        let storage = Self::open(dir)?;
        if storage.is_writable() {
            Ok(storage)
        } else {
            Err(StoreError::Locked {
                path: dir.join(LOCK_FILE).display().to_string(),
            })
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn is_persistent(&self) -> bool {
        self.root.is_some()
    }

    /// Memory-only storage counts as writable: saves succeed trivially.
    pub fn is_writable(&self) -> bool {
        self.root.is_none() || self.lock.is_some()
    }

    pub fn path_of(&self, file: StoreFile) -> Option<PathBuf> {
        self.root.as_ref().map(|r| r.join(file.file_name()))
    }

    /// Load a table, or its default when absent, corrupt, or memory-only.
    pub fn load<T: DeserializeOwned + Default>(&self, file: StoreFile) -> T {
        match self.path_of(file) {
            Some(path) => json::load_or_default(&path),
            None => T::default(),
        }
    }

    /// Atomically write a table.
    pub fn save<T: Serialize>(&self, file: StoreFile, value: &T) -> StoreResult<()> {
        let Some(path) = self.path_of(file) else {
            return Ok(());
        };
        if self.lock.is_none() {
            return Err(StoreError::ReadOnly {
                path: path.display().to_string(),
            });
        }
        json::save_json(&path, value)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn memory_storage_is_inert() {
        let storage = Storage::memory();
        assert!(!storage.is_persistent());
        assert!(storage.is_writable());
        assert!(storage.path_of(StoreFile::ValueTable).is_none());
        storage.save(StoreFile::ValueTable, &vec![1, 2, 3]).unwrap();
        let loaded: Vec<i32> = storage.load(StoreFile::ValueTable);
        assert!(loaded.is_empty());
    }

    #[test]
    fn rooted_storage_round_trips_tables() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        assert!(storage.is_writable());

        let mut table = BTreeMap::new();
        table.insert("alice_true_false_true".to_string(), 0.4);
        storage.save(StoreFile::ValueTable, &table).unwrap();
        assert!(dir.path().join("value_table.json").exists());

        let loaded: BTreeMap<String, f64> = storage.load(StoreFile::ValueTable);
        assert_eq!(loaded, table);
    }

    #[test]
    fn second_storage_is_read_only() {
        let dir = tempfile::TempDir::new().unwrap();
        let first = Storage::open(dir.path()).unwrap();
        let second = Storage::open(dir.path()).unwrap();

        assert!(first.is_writable());
        assert!(!second.is_writable());
        assert!(matches!(
            second.save(StoreFile::Corrections, &Vec::<u8>::new()),
            Err(StoreError::ReadOnly { .. })
        ));
        assert!(matches!(
            Storage::open_exclusive(dir.path()),
            Err(StoreError::Locked { .. })
        ));
    }

    #[test]
    fn clones_share_the_lock() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        let clone = storage.clone();
        drop(storage);
        assert!(clone.is_writable());
        assert!(!Storage::open(dir.path()).unwrap().is_writable());
    }

    #[test]
    fn file_names_are_distinct() {
        let mut names: Vec<_> = StoreFile::ALL.iter().map(|f| f.file_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), StoreFile::ALL.len());
    }
}
