//! Registries backed by JSON files, and their use by a run

use std::fs;
use std::sync::Arc;

use snippad::console::{console, Stream};
use snippad::driver::Driver;
use snippad::registry::{
    open_json_registries, JsonFileStore, Registry, RegistryError, StoreError, IMPORTS_FILE,
};
use snippad::session::Session;
use tempfile::TempDir;

const DEFAULTS: [&str; 2] = ["io.*", "math.*"];

#[test]
fn test_emptied_imports_are_not_reseeded() {
    let dir = TempDir::new().unwrap();
    {
        let (mut imports, _) = open_json_registries(dir.path(), &DEFAULTS).unwrap();
        assert!(imports.remove("io.*").unwrap());
        assert!(imports.remove("math.*").unwrap());
    }

    let (imports, _) = open_json_registries(dir.path(), &DEFAULTS).unwrap();
    assert!(imports.is_empty());
    let stored: Vec<String> =
        serde_json::from_str(&fs::read_to_string(dir.path().join(IMPORTS_FILE)).unwrap()).unwrap();
    assert!(stored.is_empty());
}

#[test]
fn test_malformed_store_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("classpath.json");
    fs::write(&path, "{ \"not\": \"a list\" }").unwrap();

    let err = Registry::classpath(JsonFileStore::new(&path)).unwrap_err();
    assert!(matches!(err, RegistryError::Store(StoreError::Format { .. })));
}

#[test]
fn test_classpath_entries_keep_insertion_order() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("b-lib");
    let second = dir.path().join("a-lib");
    {
        let (_, mut classpath) = open_json_registries(dir.path(), &DEFAULTS).unwrap();
        assert!(classpath.add(&first.to_string_lossy()).unwrap());
        assert!(classpath.add(&second.to_string_lossy()).unwrap());
        assert!(!classpath.add(&format!("  {}  ", first.display())).unwrap());
    }

    let (_, classpath) = open_json_registries(dir.path(), &DEFAULTS).unwrap();
    assert_eq!(
        classpath.list(),
        [
            first.to_string_lossy().to_string(),
            second.to_string_lossy().to_string()
        ]
    );
}

#[test]
fn test_registered_imports_apply_to_every_run() {
    let dir = TempDir::new().unwrap();
    let (imports, _) = open_json_registries(dir.path(), &DEFAULTS).unwrap();

    let (sender, _events) = console();
    let session = Session::builder()
        .out(sender.writer(Stream::Out))
        .err(sender.writer(Stream::Err))
        .build()
        .unwrap();
    let driver = Driver::new(Arc::new(session), sender);

    let summary = driver.run_blocking("sqrt(9.0);", &imports.list()).unwrap();
    assert_eq!(summary.valid, 1);
    assert_eq!(driver.session().imports(), ["io.*", "math.*"]);

    // Re-injecting the same imports does not duplicate them
    driver.run_blocking("abs(-2);", &imports.list()).unwrap();
    assert_eq!(driver.session().imports(), ["io.*", "math.*"]);
}
