//! Error types for filedrop_core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using filedrop_core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during storage operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Storage root failed validation at startup. The process must not serve.
    #[error("Invalid storage root at {path}: {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    /// Persisting an upload failed. No name was handed out.
    #[error("Failed to write {name}: {source}")]
    Write {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed retrieval request.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Requested name resolves outside the storage root.
    #[error("Path traversal rejected: {requested}")]
    PathTraversal { requested: String },

    /// No stored file under the requested name.
    #[error("File not found: {name}")]
    NotFound { name: String },

    /// Unexpected I/O error outside of a store operation.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl Error {
    /// Create an InvalidRoot error.
    pub fn invalid_root(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::InvalidRoot {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a Write error.
    pub fn write(name: impl Into<String>, source: std::io::Error) -> Self {
        Error::Write {
            name: name.into(),
            source,
        }
    }

    /// Create an InvalidRequest error.
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Error::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Create a PathTraversal error.
    pub fn path_traversal(requested: impl Into<String>) -> Self {
        Error::PathTraversal {
            requested: requested.into(),
        }
    }

    /// Create a NotFound error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Error::NotFound { name: name.into() }
    }

    /// Whether the caller may retry the operation that produced this error.
    ///
    /// Only write failures are transient; everything else is either a
    /// configuration fault or a property of the request itself.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Write { .. })
    }
}
