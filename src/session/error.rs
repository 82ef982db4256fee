//! Session error types

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from adding a classpath entry
#[derive(Debug, Error)]
pub enum ClasspathError {
    /// Path does not exist
    #[error("Classpath entry not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Path exists but cannot become a library
    #[error("Cannot load classpath entry {}: {reason}", path.display())]
    NotLoadable { path: PathBuf, reason: String },

    /// Dependency coordinate that does not parse
    #[error("Invalid coordinate '{0}': expected group:artifact[:extension[:classifier]]:version")]
    InvalidCoordinate(String),

    /// Library source failed to parse or check
    #[error("Library {} rejected:\n{}", path.display(), diagnostics.join("\n"))]
    Rejected {
        path: PathBuf,
        diagnostics: Vec<String>,
    },

    /// Reading a library file failed
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors returned by [`Session`](super::Session) operations
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session was closed
    #[error("Session is closed")]
    Closed,

    /// Flushing a session stream failed
    #[error("Session stream error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Classpath(#[from] ClasspathError),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;
