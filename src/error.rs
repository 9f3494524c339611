//! Error types for the collection store, archive codec, and pattern configuration.

use crate::types::CollectionId;
use thiserror::Error;

/// Failures while decoding or encoding a collection archive.
///
/// Decoding never recovers partially: the first error ends the read.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Corrupt archive: {0}")]
    Corrupt(String),

    #[error("Unexpected end of archive")]
    UnexpectedEnd,

    #[error("Cannot encode record: {0}")]
    InvalidRecord(String),

    #[error("Archive I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Failures of the collection store backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Collection not found: {0}")]
    CollectionNotFound(CollectionId),

    #[error("Collection store unavailable: {context}: {source}")]
    Unavailable {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) fn unavailable(context: impl Into<String>, source: std::io::Error) -> Self {
        StorageError::Unavailable {
            context: context.into(),
            source,
        }
    }

    /// Map an I/O error from opening a collection, treating a missing blob as not-found.
    pub(crate) fn from_open(id: CollectionId, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            StorageError::CollectionNotFound(id)
        } else {
            StorageError::unavailable(format!("failed to open collection {}", id), err)
        }
    }
}

/// Rejected glob patterns. Raised at configuration time, before anything is stored.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("Pattern at position {0} is empty")]
    Empty(usize),

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidSyntax { pattern: String, reason: String },
}

/// Crate-wide error returned by the service, index, and CLI layers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    StorageError(#[from] StorageError),

    #[error(transparent)]
    ArchiveError(#[from] ArchiveError),

    #[error(transparent)]
    PatternError(#[from] PatternError),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Upload exceeds limit of {limit} bytes")]
    UploadTooLarge { limit: u64 },

    #[error("Unsupported upload format: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ApiError {
    /// True for failures a caller may retry on idempotent reads.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::StorageError(StorageError::Unavailable { .. }))
    }

    /// True when the uploaded or stored archive itself is malformed.
    pub fn is_validation_failure(&self) -> bool {
        matches!(
            self,
            ApiError::ArchiveError(ArchiveError::Corrupt(_) | ArchiveError::UnexpectedEnd)
                | ApiError::PatternError(_)
                | ApiError::UnsupportedFormat(_)
                | ApiError::UploadTooLarge { .. }
        )
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
