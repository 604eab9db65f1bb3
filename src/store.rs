//! Key/value storage for sessions.
//!
//! Stores map string keys to string values. Both implementations are safe to
//! share between threads: reads may run concurrently, writes to the same key
//! are serialised and the last writer wins.

use crate::error::{CatalogError, CatalogResult};
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

pub trait KeyValStore {
    /// Returns the value stored under `key`, or a not-found error.
    fn read(&self, key: &str) -> CatalogResult<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: String) -> CatalogResult<()>;
}

fn missing_key(key: &str) -> CatalogError {
    CatalogError::NotFound(format!("no value found at key {}", key))
}

fn poisoned() -> CatalogError {
    CatalogError::Store("store lock poisoned".to_string())
}

/// A process-local store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValStore for InMemoryStore {
    fn read(&self, key: &str) -> CatalogResult<String> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        entries.get(key).cloned().ok_or_else(|| missing_key(key))
    }

    fn write(&self, key: &str, value: String) -> CatalogResult<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// A store persisted to a JSON object on disk.
///
/// The whole file is loaded on open and rewritten after every write.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl JsonFileStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> CatalogResult<Self> {
        let path = path.into();

        let entries = if path.exists() {
            let json = fs::read_to_string(&path).map_err(|e| {
                CatalogError::Store(format!("failed to read {}: {}", path.display(), e))
            })?;
            serde_json::from_str(&json).map_err(|e| {
                CatalogError::Store(format!("invalid store file {}: {}", path.display(), e))
            })?
        } else {
            HashMap::new()
        };

        debug!("opened session store {}", path.display());
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &HashMap<String, String>) -> CatalogResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                CatalogError::Store(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }

        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| CatalogError::Store(format!("JSON serialization failed: {}", e)))?;
        fs::write(&self.path, json).map_err(|e| {
            CatalogError::Store(format!("failed to write {}: {}", self.path.display(), e))
        })
    }
}

impl KeyValStore for JsonFileStore {
    fn read(&self, key: &str) -> CatalogResult<String> {
        let entries = self.entries.lock().map_err(|_| poisoned())?;
        entries.get(key).cloned().ok_or_else(|| missing_key(key))
    }

    fn write(&self, key: &str, value: String) -> CatalogResult<()> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value);
        self.persist(&entries)
    }
}
