//! Storage error types.

use std::fmt::Display;

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Provider could not be constructed (missing credentials, bad root, ...).
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// Provider selector is not one of `local`, `s3`, `r2`.
    #[error("unsupported storage provider: {0}")]
    UnsupportedProvider(String),

    /// Writing an object failed.
    #[error("failed to upload {path}: {message}")]
    Upload {
        /// Storage key being written.
        path: String,
        /// Backend error message.
        message: String,
    },

    /// Removing an object failed.
    #[error("failed to delete {path}: {message}")]
    Delete {
        /// Storage key being removed.
        path: String,
        /// Backend error message.
        message: String,
    },

    /// Listing objects failed.
    #[error("failed to list objects under '{prefix}': {message}")]
    List {
        /// Prefix being listed.
        prefix: String,
        /// Backend error message.
        message: String,
    },
}

impl StorageError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an unsupported provider error.
    #[must_use]
    pub fn unsupported_provider(name: impl Into<String>) -> Self {
        Self::UnsupportedProvider(name.into())
    }

    /// Create an upload error.
    #[must_use]
    pub fn upload(path: impl Into<String>, err: impl Display) -> Self {
        Self::Upload {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Create a delete error.
    #[must_use]
    pub fn delete(path: impl Into<String>, err: impl Display) -> Self {
        Self::Delete {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Create a listing error.
    #[must_use]
    pub fn list(prefix: impl Into<String>, err: impl Display) -> Self {
        Self::List {
            prefix: prefix.into(),
            message: err.to_string(),
        }
    }

    /// Whether this error happened while building the provider.
    #[must_use]
    pub fn is_construction(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::UnsupportedProvider(_))
    }
}
