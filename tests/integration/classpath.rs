//! Classpath libraries, from artifact resolution to calls

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use snippad::registry::{ArtifactResolver, LocalRepositoryResolver};
use snippad::session::{ClasspathError, Session, SessionError};
use tempfile::TempDir;

fn write(
    dir: &Path,
    relative: &str,
    content: &str,
) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn session() -> Session {
    Session::builder()
        .out(io::sink())
        .err(io::sink())
        .build()
        .unwrap()
}

#[test]
fn test_library_methods_are_callable() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "geo/shapes.snip",
        "import math.*;\ndouble hyp(double a, double b) { return sqrt(a * a + b * b); }",
    );

    let session = session();
    assert!(session.add_classpath_entry(dir.path()).unwrap());
    assert_eq!(session.packages(), ["geo.shapes"]);
    assert_eq!(
        session.evaluate("geo.shapes.hyp(3.0, 4.0);").unwrap()[0]
            .value
            .as_deref(),
        Some("5.0")
    );

    session.evaluate("import geo.shapes.*;").unwrap();
    assert_eq!(
        session.evaluate("hyp(6.0, 8.0);").unwrap()[0].value.as_deref(),
        Some("10.0")
    );
}

#[test]
fn test_readding_an_entry_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "util.snip", "int one() { return 1; }");

    let session = session();
    assert!(session.add_classpath_entry(&file).unwrap());
    assert!(!session.add_classpath_entry(&file).unwrap());
    assert_eq!(session.classpath(), [file]);
}

#[test]
fn test_missing_entry_is_not_found() {
    let session = session();
    let err = session
        .add_classpath_entry("/no/such/library.snip")
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Classpath(ClasspathError::NotFound { .. })
    ));
    assert!(session.classpath().is_empty());
}

#[test]
fn test_rejected_library_loads_nothing() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "good.snip", "int one() { return 1; }");
    write(dir.path(), "bad.snip", "int two() { return \"two\"; }");

    let session = session();
    let err = session.add_classpath_entry(dir.path()).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Classpath(ClasspathError::Rejected { .. })
    ));
    assert!(session.packages().is_empty());
    assert!(session.evaluate("good.one();").unwrap()[0].is_rejected());
}

#[test]
fn test_coordinates_resolve_into_the_repository() {
    let repo = TempDir::new().unwrap();
    let artifact = write(
        repo.path(),
        "org/example/strings/1.2/strings-1.2.snip",
        "String shout(String s) { return text.upper(s) + \"!\"; }",
    );
    let resolver = LocalRepositoryResolver::new(repo.path());

    let path = resolver.resolve("org.example:strings:1.2").unwrap();
    assert_eq!(path, artifact);
    assert!(matches!(
        resolver.resolve("org.example:strings:9.9"),
        Err(ClasspathError::NotFound { .. })
    ));

    let session = session();
    session.add_classpath_entry(&path).unwrap();
    assert_eq!(session.packages(), ["strings"]);
    assert_eq!(
        session.evaluate("strings.shout(\"hey\");").unwrap()[0]
            .value
            .as_deref(),
        Some("\"HEY!\"")
    );
}
