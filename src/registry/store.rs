//! Persistence for registry lists

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors from a [`ListStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Store {} is not a JSON list of strings: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// External key/value store holding one list
pub trait ListStore: Send {
    fn load(&self) -> Result<Vec<String>, StoreError>;

    fn save(
        &self,
        entries: &[String],
    ) -> Result<(), StoreError>;

    /// Whether the list has ever been saved
    fn is_initialized(&self) -> bool;
}

/// List kept as a JSON array in a file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(
        &self,
        source: io::Error,
    ) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ListStore for JsonFileStore {
    fn load(&self) -> Result<Vec<String>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(self.io_error(err)),
        };
        serde_json::from_str(&text).map_err(|source| StoreError::Format {
            path: self.path.clone(),
            source,
        })
    }

    /// Written to a temporary file first, then renamed over the old list
    fn save(
        &self,
        entries: &[String],
    ) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|err| self.io_error(err))?;

        let mut file = NamedTempFile::new_in(&dir).map_err(|err| self.io_error(err))?;
        serde_json::to_writer_pretty(&mut file, entries).map_err(|source| StoreError::Format {
            path: self.path.clone(),
            source,
        })?;
        file.write_all(b"\n").map_err(|err| self.io_error(err))?;
        file.persist(&self.path)
            .map_err(|err| self.io_error(err.error))?;
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.path.exists()
    }
}

/// In-memory store; clones share the same list
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<Option<Vec<String>>>>,
}

impl MemoryStore {
    /// Store that has never been written
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that already holds `entries`
    pub fn with_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: Arc::new(Mutex::new(Some(entries.into_iter().map(Into::into).collect()))),
        }
    }

    /// Last saved list
    pub fn entries(&self) -> Option<Vec<String>> {
        self.entries.lock().clone()
    }
}

impl ListStore for MemoryStore {
    fn load(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.lock().clone().unwrap_or_default())
    }

    fn save(
        &self,
        entries: &[String],
    ) -> Result<(), StoreError> {
        *self.entries.lock() = Some(entries.to_vec());
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.entries.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_json_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("imports.json"));
        assert!(!store.is_initialized());
        assert!(store.load().unwrap().is_empty());

        store
            .save(&["math.*".to_string(), "text.*".to_string()])
            .unwrap();
        assert!(store.is_initialized());
        assert_eq!(store.load().unwrap(), ["math.*", "text.*"]);
    }

    #[test]
    fn test_json_store_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("classpath.json");
        fs::write(&path, "{\"not\": \"a list\"}").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Format { .. })));
    }

    #[test]
    fn test_memory_store_shares_state() {
        let store = MemoryStore::new();
        let view = store.clone();
        assert!(!view.is_initialized());
        store.save(&["io.*".to_string()]).unwrap();
        assert_eq!(view.entries(), Some(vec!["io.*".to_string()]));
    }
}
