//! Key-value settings persistence
//!
//! A store maps string keys to JSON values. Missing keys read as `None`;
//! read and write failures are reported as [`Error::StorageError`] so that
//! callers never mistake a broken store for an empty one.

use crate::{Error, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// Persistent key-value store for user settings
pub trait SettingsStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// Process-local store, mostly for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| Error::StorageError(format!("Memory store poisoned: {}", e)))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| Error::StorageError(format!("Memory store poisoned: {}", e)))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store backed by a single JSON object file.
///
/// A missing or empty file is an empty store. Writes rewrite the whole file
/// through a uniquely named sibling temporary file that is renamed over the
/// target, so readers always see a complete document. Writes through one store
/// (and its clones) are serialized; separate stores on the same path may lose
/// each other's concurrent updates but never corrupt the file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(Error::StorageError(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(&raw).map_err(|e| {
            Error::StorageError(format!("Malformed settings file {}: {}", self.path.display(), e))
        })
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| Error::StorageError(format!("Settings lock poisoned: {}", e)))?;

        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value);

        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(|e| {
                    Error::StorageError(format!("Failed to create {}: {}", parent.display(), e))
                })?;
                parent
            }
            None => Path::new("."),
        };

        let body = serde_json::to_string_pretty(&Value::Object(entries))?;
        let write_err =
            |e: std::io::Error| Error::StorageError(format!("Failed to write {}: {}", self.path.display(), e));
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(body.as_bytes()).map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;
        log::debug!("Wrote settings key '{}' to {}", key, self.path.display());
        Ok(())
    }
}
