//! Durable client-side key/value storage (the browser's local storage in
//! the original UI).
//!
//! `FileStorage` keeps one JSON object on disk and rewrites it on every
//! change. Write failures are logged and the in-memory value still wins for
//! the rest of the session.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

pub const TOKEN_STORAGE_KEY: &str = "access_token";
pub const THEME_STORAGE_KEY: &str = "admin-theme";

pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt storage file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStorage {
    /// Open (or lazily create) the store at `path`. A missing file is an
    /// empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Read { path, source }),
        };
        Ok(Self { path, entries })
    }

    fn flush(&self) {
        let result = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| e.to_string())
            .and_then(|json| fs::write(&self.path, json).map_err(|e| e.to_string()));
        if let Err(e) = result {
            warn!(path = %self.path.display(), error = %e, "failed to persist storage");
        }
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush();
    }

    fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_set_get_remove() {
        let mut s = MemoryStorage::new();
        s.set("k", "v");
        assert_eq!(s.get("k").as_deref(), Some("v"));
        s.remove("k");
        assert!(s.get("k").is_none());
    }

    #[test]
    fn file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let mut first = FileStorage::open(&path).unwrap();
        first.set(THEME_STORAGE_KEY, "dark");
        drop(first);

        let second = FileStorage::open(&path).unwrap();
        assert_eq!(second.get(THEME_STORAGE_KEY).as_deref(), Some("dark"));
    }

    #[test]
    fn file_storage_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(FileStorage::open(&path), Err(StorageError::Corrupt { .. })));
    }
}
