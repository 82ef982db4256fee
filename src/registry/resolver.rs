//! Classpath artifact resolution
//!
//! Turns what the user typed into `classpath add` (a path or a dependency
//! coordinate) into an absolute path the session can load. Coordinates
//! are looked up in a local repository laid out like a Maven repository;
//! nothing is downloaded.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::session::library::LIBRARY_EXTENSION;
use crate::session::ClasspathError;

/// Resolves a classpath spec to a loadable path
pub trait ArtifactResolver {
    fn resolve(
        &self,
        spec: &str,
    ) -> Result<PathBuf, ClasspathError>;
}

/// `group:artifact[:extension[:classifier]]:version`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    pub extension: String,
    pub classifier: Option<String>,
    pub version: String,
}

impl Coordinate {
    pub fn parse(spec: &str) -> Result<Self, ClasspathError> {
        let invalid = || ClasspathError::InvalidCoordinate(spec.to_string());
        let parts: Vec<&str> = spec.trim().split(':').collect();
        if parts.iter().any(|part| part.trim().is_empty()) {
            return Err(invalid());
        }
        let (extension, classifier) = match parts.len() {
            3 => (LIBRARY_EXTENSION, None),
            4 => (parts[2], None),
            5 => (parts[2], Some(parts[3].to_string())),
            _ => return Err(invalid()),
        };
        Ok(Self {
            group: parts[0].to_string(),
            artifact: parts[1].to_string(),
            extension: extension.to_string(),
            classifier,
            version: parts[parts.len() - 1].to_string(),
        })
    }

    /// `group/as/dirs/artifact/version/artifact-version[-classifier].extension`
    pub fn relative_path(&self) -> PathBuf {
        let mut path: PathBuf = self.group.split('.').collect();
        path.push(&self.artifact);
        path.push(&self.version);
        let file = match &self.classifier {
            Some(classifier) => format!(
                "{}-{}-{}.{}",
                self.artifact, self.version, classifier, self.extension
            ),
            None => format!("{}-{}.{}", self.artifact, self.version, self.extension),
        };
        path.push(file);
        path
    }
}

/// Resolver backed by a local artifact repository
#[derive(Debug, Clone)]
pub struct LocalRepositoryResolver {
    repository: PathBuf,
}

impl LocalRepositoryResolver {
    pub fn new(repository: impl Into<PathBuf>) -> Self {
        Self {
            repository: repository.into(),
        }
    }

    pub fn repository(&self) -> &Path {
        &self.repository
    }
}

/// Whether `spec` should be read as a path rather than a coordinate
fn looks_like_path(spec: &str) -> bool {
    let path = Path::new(spec);
    path.is_absolute()
        || spec.starts_with('.')
        || spec.contains('/')
        || spec.contains('\\')
        || !spec.contains(':')
}

impl ArtifactResolver for LocalRepositoryResolver {
    fn resolve(
        &self,
        spec: &str,
    ) -> Result<PathBuf, ClasspathError> {
        let spec = spec.trim();
        let path = if looks_like_path(spec) {
            std::path::absolute(spec).map_err(|source| ClasspathError::Io {
                path: PathBuf::from(spec),
                source,
            })?
        } else {
            let coordinate = Coordinate::parse(spec)?;
            self.repository.join(coordinate.relative_path())
        };
        debug!("resolved {} to {}", spec, path.display());

        if path.exists() {
            Ok(path)
        } else {
            Err(ClasspathError::NotFound { path })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_coordinate_forms() {
        let plain = Coordinate::parse("org.acme:shapes:1.2").unwrap();
        assert_eq!(
            plain.relative_path(),
            Path::new("org/acme/shapes/1.2/shapes-1.2.snip")
        );

        let classified = Coordinate::parse("org.acme:shapes:snip:extra:1.2").unwrap();
        assert_eq!(
            classified.relative_path(),
            Path::new("org/acme/shapes/1.2/shapes-1.2-extra.snip")
        );

        assert!(matches!(
            Coordinate::parse("org.acme:shapes"),
            Err(ClasspathError::InvalidCoordinate(_))
        ));
        assert!(Coordinate::parse("org.acme::1.0").is_err());
    }

    #[test]
    fn test_resolves_coordinates_in_repository() {
        let repo = TempDir::new().unwrap();
        let artifact = repo.path().join("org/acme/shapes/1.2/shapes-1.2.snip");
        fs::create_dir_all(artifact.parent().unwrap()).unwrap();
        fs::write(&artifact, "int one() { return 1; }").unwrap();

        let resolver = LocalRepositoryResolver::new(repo.path());
        assert_eq!(resolver.resolve("org.acme:shapes:1.2").unwrap(), artifact);
        assert!(matches!(
            resolver.resolve("org.acme:shapes:2.0"),
            Err(ClasspathError::NotFound { .. })
        ));
    }

    #[test]
    fn test_resolves_paths() {
        let dir = TempDir::new().unwrap();
        let resolver = LocalRepositoryResolver::new(dir.path());
        let spec = dir.path().to_string_lossy().into_owned();
        assert_eq!(resolver.resolve(&spec).unwrap(), dir.path());
        assert!(matches!(
            resolver.resolve("/no/such/library.snip"),
            Err(ClasspathError::NotFound { .. })
        ));
    }
}
