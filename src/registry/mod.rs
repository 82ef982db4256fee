//! Import and classpath registries
//!
//! Small ordered lists, deduplicated and persisted through a
//! [`ListStore`]. The import registry is re-injected before every run;
//! classpath entries are applied to the session once, when added.

use std::fmt;
use std::path::Path;

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

pub mod resolver;
pub mod store;

pub use resolver::{ArtifactResolver, Coordinate, LocalRepositoryResolver};
pub use store::{JsonFileStore, ListStore, MemoryStore, StoreError};

/// File name of the persisted import list
pub const IMPORTS_FILE: &str = "imports.json";
/// File name of the persisted classpath list
pub const CLASSPATH_FILE: &str = "classpath.json";

static IMPORT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][\w$]*(\.[A-Za-z_$][\w$]*)*(\.\*)?$").expect("import pattern is valid")
});

/// What a registry holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryKind {
    Imports,
    Classpath,
}

impl fmt::Display for RegistryKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            RegistryKind::Imports => f.write_str("import"),
            RegistryKind::Classpath => f.write_str("classpath entry"),
        }
    }
}

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Entry does not have the shape the registry requires
    #[error("Invalid {kind} '{entry}': {reason}")]
    InvalidEntry {
        kind: RegistryKind,
        entry: String,
        reason: &'static str,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Persisted, deduplicated, insertion-ordered list
pub struct Registry {
    kind: RegistryKind,
    entries: IndexSet<String>,
    store: Box<dyn ListStore>,
}

impl fmt::Debug for Registry {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Registry")
            .field("kind", &self.kind)
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Open the import registry, seeding `defaults` on first use
    pub fn imports<S: AsRef<str>>(
        store: impl ListStore + 'static,
        defaults: &[S],
    ) -> Result<Self, RegistryError> {
        Self::open(RegistryKind::Imports, Box::new(store), defaults)
    }

    /// Open the classpath registry
    pub fn classpath(store: impl ListStore + 'static) -> Result<Self, RegistryError> {
        Self::open(RegistryKind::Classpath, Box::new(store), &[] as &[&str])
    }

    fn open<S: AsRef<str>>(
        kind: RegistryKind,
        store: Box<dyn ListStore>,
        defaults: &[S],
    ) -> Result<Self, RegistryError> {
        let mut registry = Self {
            kind,
            entries: IndexSet::new(),
            store,
        };

        if !registry.store.is_initialized() {
            debug!("seeding {} registry with {} defaults", kind, defaults.len());
            for entry in defaults {
                registry.insert_loaded(entry.as_ref());
            }
            registry.save()?;
            return Ok(registry);
        }

        for entry in registry.store.load()? {
            registry.insert_loaded(&entry);
        }
        Ok(registry)
    }

    /// Insert a stored entry, skipping ones that no longer validate
    fn insert_loaded(
        &mut self,
        entry: &str,
    ) {
        let entry = entry.trim();
        if entry.is_empty() {
            return;
        }
        match self.validate(entry) {
            Ok(()) => {
                self.entries.insert(entry.to_string());
            }
            Err(err) => warn!("ignoring stored entry: {}", err),
        }
    }

    fn validate(
        &self,
        entry: &str,
    ) -> Result<(), RegistryError> {
        let reason = match self.kind {
            RegistryKind::Imports if !IMPORT_PATTERN.is_match(entry) => {
                Some("expected a package name, optionally followed by '.*'")
            }
            RegistryKind::Classpath if !Path::new(entry).is_absolute() => {
                Some("expected an absolute path")
            }
            _ => None,
        };
        match reason {
            Some(reason) => Err(RegistryError::InvalidEntry {
                kind: self.kind,
                entry: entry.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }

    fn save(&self) -> Result<(), RegistryError> {
        let entries: Vec<String> = self.entries.iter().cloned().collect();
        self.store.save(&entries)?;
        Ok(())
    }

    /// Append an entry; blank or present entries are a silent no-op
    pub fn add(
        &mut self,
        entry: &str,
    ) -> Result<bool, RegistryError> {
        let entry = entry.trim();
        if entry.is_empty() || self.entries.contains(entry) {
            return Ok(false);
        }
        self.validate(entry)?;

        self.entries.insert(entry.to_string());
        if let Err(err) = self.save() {
            self.entries.shift_remove(entry);
            return Err(err);
        }
        debug!("added {} {}", self.kind, entry);
        Ok(true)
    }

    /// Remove an entry, keeping the order of the rest
    pub fn remove(
        &mut self,
        entry: &str,
    ) -> Result<bool, RegistryError> {
        let entry = entry.trim();
        let Some(index) = self.entries.get_index_of(entry) else {
            return Ok(false);
        };
        self.entries.shift_remove_index(index);
        if let Err(err) = self.save() {
            self.entries.shift_insert(index, entry.to_string());
            return Err(err);
        }
        debug!("removed {} {}", self.kind, entry);
        Ok(true)
    }

    pub fn list(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn contains(
        &self,
        entry: &str,
    ) -> bool {
        self.entries.contains(entry.trim())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn kind(&self) -> RegistryKind {
        self.kind
    }
}

/// Open the import and classpath registries stored as JSON files in `dir`
pub fn open_json_registries<S: AsRef<str>>(
    dir: &Path,
    default_imports: &[S],
) -> Result<(Registry, Registry), RegistryError> {
    let imports = Registry::imports(JsonFileStore::new(dir.join(IMPORTS_FILE)), default_imports)?;
    let classpath = Registry::classpath(JsonFileStore::new(dir.join(CLASSPATH_FILE)))?;
    Ok((imports, classpath))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: [&str; 3] = ["io.*", "math.*", "text.*"];

    #[test]
    fn test_first_open_seeds_defaults() {
        let store = MemoryStore::new();
        let registry = Registry::imports(store.clone(), &DEFAULTS).unwrap();
        assert_eq!(registry.list(), DEFAULTS);
        assert_eq!(store.entries().unwrap(), DEFAULTS);

        let reopened = Registry::imports(MemoryStore::with_entries(["math.*"]), &DEFAULTS).unwrap();
        assert_eq!(reopened.list(), ["math.*"]);
    }

    #[test]
    fn test_blank_and_duplicate_adds_are_ignored() {
        let mut registry = Registry::imports(MemoryStore::new(), &DEFAULTS).unwrap();
        assert!(!registry.add("").unwrap());
        assert!(!registry.add("   ").unwrap());
        assert!(!registry.add("math.*").unwrap());
        assert_eq!(registry.len(), 3);

        assert!(registry.add("geometry.shapes.area").unwrap());
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_invalid_import_is_rejected() {
        let mut registry = Registry::imports(MemoryStore::new(), &DEFAULTS).unwrap();
        let err = registry.add("math.*.x").unwrap_err();
        assert!(matches!(err, RegistryError::InvalidEntry { .. }));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_classpath_requires_absolute_paths() {
        let store = MemoryStore::new();
        let mut registry = Registry::classpath(store.clone()).unwrap();
        assert!(registry.is_empty());
        assert!(registry.add("relative/lib").is_err());

        let absolute = std::env::temp_dir().join("libs");
        let absolute = absolute.to_string_lossy();
        assert!(registry.add(&absolute).unwrap());
        assert!(!registry.add(&absolute).unwrap());
        assert_eq!(store.entries().unwrap(), [absolute.to_string()]);
    }

    #[test]
    fn test_remove_keeps_order() {
        let store = MemoryStore::new();
        let mut registry = Registry::imports(store.clone(), &DEFAULTS).unwrap();
        assert!(registry.remove("math.*").unwrap());
        assert!(!registry.remove("math.*").unwrap());
        assert_eq!(registry.list(), ["io.*", "text.*"]);
        assert_eq!(store.entries().unwrap(), ["io.*", "text.*"]);
    }

    #[test]
    fn test_json_registries_persist_across_opens() {
        let dir = tempfile::TempDir::new().unwrap();
        {
            let (mut imports, classpath) = open_json_registries(dir.path(), &DEFAULTS).unwrap();
            assert!(classpath.is_empty());
            assert!(imports.add("util.*").unwrap());
        }
        assert!(dir.path().join(IMPORTS_FILE).exists());

        let (imports, _) = open_json_registries(dir.path(), &DEFAULTS).unwrap();
        assert_eq!(imports.list(), ["io.*", "math.*", "text.*", "util.*"]);
    }

    #[test]
    fn test_stored_invalid_entries_are_skipped() {
        let store = MemoryStore::with_entries(["math.*", "not an import", "math.*"]);
        let registry = Registry::imports(store, &DEFAULTS).unwrap();
        assert_eq!(registry.list(), ["math.*"]);
    }
}
