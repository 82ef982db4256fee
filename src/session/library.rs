//! Classpath libraries
//!
//! A classpath entry is a `.snip` file or a directory of them. Every file
//! becomes one package named after its path relative to the entry
//! (`text/extra.snip` is package `text.extra`); a single file is named
//! after its stem, without a `-version` suffix (`strings-1.2.snip` is
//! package `strings`). Library files may only contain imports and methods.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, info};
use walkdir::WalkDir;

use super::error::ClasspathError;
use super::natives;
use super::state::{LibraryEnv, Linker};
use crate::frontend::check::{check_method, Environment};
use crate::frontend::parse_unit;
use crate::frontend::parser::ast::{ImportDecl, MethodDecl, StmtKind};
use crate::util::diagnostic::Diagnostic;

/// Library file extension
pub const LIBRARY_EXTENSION: &str = "snip";

/// A loaded library package
#[derive(Debug)]
pub struct Library {
    pub package: String,
    /// Source file
    pub path: PathBuf,
    pub imports: Vec<ImportDecl>,
    pub methods: IndexMap<String, Arc<MethodDecl>>,
}

impl Library {
    /// Method signatures in declaration order
    pub fn signatures(&self) -> Vec<String> {
        self.methods.values().map(|method| method.signature()).collect()
    }
}

/// Load every package under `entry`
///
/// `loaded` holds the packages already on the classpath. Packages of one
/// entry may call each other; nothing is returned unless all of them check.
pub(crate) fn load_entry(
    entry: &Path,
    loaded: &IndexMap<String, Arc<Library>>,
) -> Result<Vec<Arc<Library>>, ClasspathError> {
    let files = library_files(entry)?;
    let mut libraries = Vec::with_capacity(files.len());
    let mut packages = IndexSet::new();

    for (path, package) in files {
        if !is_package_name(&package) {
            return Err(not_loadable(
                &path,
                format!("'{}' is not a valid package name", package),
            ));
        }
        if natives::package(&package).is_some() || loaded.contains_key(&package) {
            return Err(not_loadable(
                &path,
                format!("package {} is already defined", package),
            ));
        }
        if !packages.insert(package.clone()) {
            return Err(not_loadable(
                &path,
                format!("package {} is defined twice", package),
            ));
        }
        debug!("parsing library {} from {}", package, path.display());
        libraries.push(Arc::new(parse_library(path, package)?));
    }

    // Register the whole entry before checking so packages can refer to
    // each other.
    let mut linked = loaded.clone();
    for library in &libraries {
        linked.insert(library.package.clone(), library.clone());
    }
    let no_methods = IndexMap::new();
    let no_imports = IndexSet::new();
    let linker = Linker {
        libraries: &linked,
        methods: &no_methods,
        imports: &no_imports,
    };

    for library in &libraries {
        let env = LibraryEnv {
            linker,
            library: library.clone(),
        };
        let mut diagnostics = Vec::new();
        for import in &library.imports {
            if let Err(message) = env.import(import) {
                diagnostics.push(message);
            }
        }
        for method in library.methods.values() {
            if let Err(errors) = check_method(&env, method) {
                diagnostics.extend(errors.iter().map(Diagnostic::to_string));
            }
        }
        if !diagnostics.is_empty() {
            return Err(ClasspathError::Rejected {
                path: library.path.clone(),
                diagnostics,
            });
        }
        info!(
            "loaded package {} ({} methods)",
            library.package,
            library.methods.len()
        );
    }

    Ok(libraries)
}

/// Library files under `entry` and their package names, sorted by path
fn library_files(entry: &Path) -> Result<Vec<(PathBuf, String)>, ClasspathError> {
    let metadata = fs::metadata(entry).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ClasspathError::NotFound {
            path: entry.to_path_buf(),
        },
        _ => ClasspathError::Io {
            path: entry.to_path_buf(),
            source,
        },
    })?;

    if metadata.is_file() {
        if !has_library_extension(entry) {
            return Err(not_loadable(
                entry,
                format!("expected a .{} file or a directory", LIBRARY_EXTENSION),
            ));
        }
        let stem = entry
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();
        let package = stem.split('-').next().unwrap_or(stem).to_string();
        return Ok(vec![(entry.to_path_buf(), package)]);
    }

    let mut files = Vec::new();
    for item in WalkDir::new(entry).follow_links(true).sort_by_file_name() {
        let item = item.map_err(|err| ClasspathError::Io {
            path: entry.to_path_buf(),
            source: err.into(),
        })?;
        if !item.file_type().is_file() || !has_library_extension(item.path()) {
            continue;
        }
        let relative = item
            .path()
            .strip_prefix(entry)
            .unwrap_or(item.path())
            .with_extension("");
        let package: Vec<&str> = relative
            .components()
            .filter_map(|component| component.as_os_str().to_str())
            .collect();
        files.push((item.path().to_path_buf(), package.join(".")));
    }

    if files.is_empty() {
        return Err(not_loadable(
            entry,
            format!("directory contains no .{} files", LIBRARY_EXTENSION),
        ));
    }
    Ok(files)
}

fn parse_library(
    path: PathBuf,
    package: String,
) -> Result<Library, ClasspathError> {
    let source = fs::read_to_string(&path).map_err(|source| ClasspathError::Io {
        path: path.clone(),
        source,
    })?;

    let rejected = |path: &Path, diagnostics: &[Diagnostic]| ClasspathError::Rejected {
        path: path.to_path_buf(),
        diagnostics: diagnostics.iter().map(Diagnostic::to_string).collect(),
    };

    let stmts = parse_unit(&source).map_err(|diagnostics| rejected(&path, &diagnostics))?;

    let mut imports = Vec::new();
    let mut methods = IndexMap::new();
    let mut diagnostics = Vec::new();
    for stmt in stmts {
        match stmt.kind {
            StmtKind::Import(import) => imports.push(import),
            StmtKind::Method(method) => {
                if methods.contains_key(&method.name) {
                    diagnostics.push(Diagnostic::new(
                        format!("method {} is already defined in package {}", method.name, package),
                        method.span,
                    ));
                } else {
                    methods.insert(method.name.clone(), method);
                }
            }
            _ => diagnostics.push(Diagnostic::new(
                "only imports and method declarations are allowed in a library",
                stmt.span,
            )),
        }
    }
    if !diagnostics.is_empty() {
        return Err(rejected(&path, &diagnostics));
    }

    Ok(Library {
        package,
        path,
        imports,
        methods,
    })
}

fn has_library_extension(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(LIBRARY_EXTENSION)
}

fn is_package_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .is_some_and(|c| unicode_ident::is_xid_start(c) || c == '_')
                && chars.all(unicode_ident::is_xid_continue)
        })
}

fn not_loadable(
    path: &Path,
    reason: String,
) -> ClasspathError {
    ClasspathError::NotLoadable {
        path: path.to_path_buf(),
        reason,
    }
}
