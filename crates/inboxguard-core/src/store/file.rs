use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::KeyValueStore;
use crate::error::CoreError;

/// JSON object on disk. Every write rewrites the whole file through a
/// temp file + rename.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn storage_err(&self, action: &str, err: impl std::fmt::Display) -> CoreError {
        CoreError::Storage {
            message: format!("cannot {action} {}: {err}", self.path.display()),
        }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, CoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| self.storage_err("parse", e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(self.storage_err("read", e)),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.storage_err("create directory for", e))?;
        }
        let json = serde_json::to_string_pretty(entries).map_err(|e| self.storage_err("serialize", e))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| self.storage_err("write", e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.storage_err("replace", e))?;
        debug!(path = %self.path.display(), keys = entries.len(), "store saved");
        Ok(())
    }

    fn with_lock<T>(&self, f: impl FnOnce() -> Result<T, CoreError>) -> Result<T, CoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| CoreError::Internal("store lock poisoned".into()))?;
        f()
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        self.with_lock(|| Ok(self.read_all()?.remove(key)))
    }

    fn set(&self, key: &str, value: String) -> Result<(), CoreError> {
        self.with_lock(|| {
            let mut entries = self.read_all()?;
            entries.insert(key.to_owned(), value);
            self.write_all(&entries)
        })
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        self.with_lock(|| {
            let mut entries = self.read_all()?;
            if entries.remove(key).is_some() {
                self.write_all(&entries)?;
            }
            Ok(())
        })
    }
}
