//! Error types for cataloguing.
//!
//! The pure parts of the crate (name splitting, timestamp inference,
//! destination resolution) never fail. Everything that reaches the disk or
//! the session store reports a [`CatalogError`], and [`CatalogError::kind`]
//! tells callers which of the broad failure classes it belongs to.

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Broad classes of failure, used to choose how an error is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A file, directory or session key does not exist.
    NotFound,
    /// Input was present but unusable, e.g. a path that is not a directory.
    Validation,
    /// A required field was missing from the caller's request.
    BadRequest,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// Process exit code used by the command line tool.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Internal => 1,
            ErrorKind::BadRequest => 2,
            ErrorKind::NotFound => 3,
            ErrorKind::Validation => 4,
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("missing field: {0}")]
    MissingField(String),

    #[error("failed to read directory {}: {source}", .path.display())]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to copy {} to {}: {source}", .from.display(), .to.display())]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The copy succeeded but the original could not be deleted; the
    /// duplicate is left in place.
    #[error("copied {} but failed to remove the original: {source}", .path.display())]
    RemoveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session store error: {0}")]
    Store(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::NotFound(_) => ErrorKind::NotFound,
            CatalogError::Validation(_) => ErrorKind::Validation,
            CatalogError::MissingField(_) => ErrorKind::BadRequest,
            CatalogError::ReadDirectory { source, .. } | CatalogError::ReadFile { source, .. }
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                ErrorKind::NotFound
            }
            CatalogError::Config(ConfigError::ConfigNotFound(_)) => ErrorKind::NotFound,
            CatalogError::Config(_) => ErrorKind::Validation,
            _ => ErrorKind::Internal,
        }
    }

    pub(crate) fn missing_field(field: &str) -> Self {
        CatalogError::MissingField(field.to_string())
    }
}

/// Result type for cataloguing operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
