//! Error types for the DDR core.
//!
//! Identification failures are local and immediate, backend failures are
//! captured per file by the reconciler, and manifest validation never errors
//! at all (see [`crate::inventory::Validation`]).

use std::path::PathBuf;
use thiserror::Error;

/// Which textual surface an identifier was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSurface {
    Id,
    Path,
    Url,
}

impl std::fmt::Display for IdSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdSurface::Id => write!(f, "id"),
            IdSurface::Path => write!(f, "path"),
            IdSurface::Url => write!(f, "url"),
        }
    }
}

/// Main error type for the DDR core.
#[derive(Debug, Error)]
pub enum DdrError {
    // Identification errors
    #[error("Could not identify object from {surface}: \"{text}\"")]
    InvalidIdentifier { text: String, surface: IdSurface },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    // Configuration errors
    #[error("Required setting missing: {key}")]
    ConfigurationMissing { key: String },

    // Content-store errors
    #[error("Content store {operation} failed: {message}")]
    Backend { operation: String, message: String },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Inventory errors
    #[error("Store not found: {label}")]
    StoreNotFound { label: String },

    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,
}

/// Result type alias for DDR operations.
pub type Result<T> = std::result::Result<T, DdrError>;

impl From<std::io::Error> for DdrError {
    fn from(err: std::io::Error) -> Self {
        DdrError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for DdrError {
    fn from(err: serde_json::Error) -> Self {
        DdrError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl DdrError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        DdrError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Shorthand for a backend failure.
    pub fn backend(operation: impl Into<String>, message: impl Into<String>) -> Self {
        DdrError::Backend {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        DdrError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Check if this error is worth retrying on a later pass.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DdrError::Backend { .. } | DdrError::DeadlineExceeded | DdrError::Io { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DdrError::InvalidIdentifier {
            text: "ddr-".into(),
            surface: IdSurface::Id,
        };
        assert_eq!(err.to_string(), "Could not identify object from id: \"ddr-\"");

        let err = DdrError::ConfigurationMissing {
            key: "access_file_append".into(),
        };
        assert_eq!(err.to_string(), "Required setting missing: access_file_append");
    }

    #[test]
    fn test_retryable_errors() {
        assert!(DdrError::backend("get", "remote unreachable").is_retryable());
        assert!(DdrError::DeadlineExceeded.is_retryable());
        assert!(!DdrError::invalid_argument("relative path").is_retryable());
        assert!(!DdrError::Cancelled.is_retryable());
    }
}
