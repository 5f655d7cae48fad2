//! Durable key-value backends for the session store.
//!
//! Every backend is infallible from the caller's point of view: a backend that
//! cannot read or write logs the failure and behaves as if the entry is absent.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use fd_lock::RwLock;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::warn;

/// String key-value storage shared by every component of the process
pub trait KeyValueStorage: Send + Sync + Debug {
    fn get_item(&self, key: &str) -> Option<String>;

    /// Replace the whole value stored under `key`
    fn set_item(&self, key: &str, value: &str);

    fn remove_item(&self, key: &str);
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("session file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("session file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// In-process storage, lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn set_item(&self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove_item(&self, key: &str) {
        self.entries.remove(key);
    }
}

/// Storage persisted as a flat JSON object in a single file.
///
/// Every write holds an exclusive lock on a sibling `<file>.lock` while it
/// reads, modifies and replaces the document, so writers in any process are
/// serialized and never undo each other's keys. The new document is written to
/// a uniquely named temp file and renamed over the original; readers see
/// either the old or the new document.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn open_lock_file(&self) -> Result<File, StorageError> {
        Ok(OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?)
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let mut temp = NamedTempFile::new_in(self.directory())?;
        temp.write_all(&serde_json::to_vec_pretty(entries)?)?;
        temp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn locked_update(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StorageError> {
        fs::create_dir_all(self.directory())?;
        let mut lock = RwLock::new(self.open_lock_file()?);
        let _guard = lock.write()?;

        let mut entries = self.load().unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "discarding unreadable session file");
            BTreeMap::new()
        });
        apply(&mut entries);
        self.persist(&entries)
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) {
        if let Err(e) = self.locked_update(apply) {
            warn!(path = %self.path.display(), error = %e, "failed to write session file");
        }
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        match self.load() {
            Ok(mut entries) => entries.remove(key),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read session file");
                None
            }
        }
    }

    fn set_item(&self, key: &str, value: &str) {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        });
    }

    fn remove_item(&self, key: &str) {
        self.update(|entries| {
            entries.remove(key);
        });
    }
}
