//! Error types for OIV package handling.

use std::io;
use std::path::PathBuf;

use crate::manifest::PropertyKind;
use crate::package::SessionState;

/// Errors raised while opening, reading or cleaning up an OIV package.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("OIV archive not found: {0}")]
    NotFound(PathBuf),

    #[error("corrupt zip archive {path}: {source}")]
    CorruptArchive {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    #[error("archive entry '{entry}' resolves outside the extraction directory")]
    SecurityViolation { entry: String },

    #[error("I/O error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("OIV package has already been extracted")]
    AlreadyOpened,

    #[error("OIV package must be {expected} for this operation, but it is {actual}")]
    InvalidState {
        expected: SessionState,
        actual: SessionState,
    },

    #[error("no assembly.xml found under {0}")]
    ManifestNotFound(PathBuf),

    #[error("malformed manifest: {0}")]
    MalformedManifest(String),

    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("invalid {property} value '{value}': {reason}")]
    Property {
        property: PropertyKind,
        value: String,
        reason: String,
    },

    #[error("could not determine a per-user data directory")]
    NoDataDir,
}

impl Error {
    /// Wrap an I/O error with the path it happened at.
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
