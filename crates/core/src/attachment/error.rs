//! Attachment error types.

use stowage_shared::AppError;
use thiserror::Error;

use crate::media::ConversionError;
use crate::storage::StorageError;

/// Broad failure category, for callers that map errors to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No upload policy registered for the model/field.
    Config,
    /// Upload rejected by size or extension policy.
    Validation,
    /// Storage provider could not be built.
    ProviderConstruction,
    /// Blob store operation failed.
    Upload,
    /// Media conversion failed.
    Conversion,
    /// Relational store operation failed.
    Persistence,
    /// No matching attachment.
    NotFound,
    /// Provider cannot list objects.
    ListingUnsupported,
}

/// Attachment operation errors.
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// No config registered for the model.
    #[error("no attachment config found for model {model}")]
    ModelNotRegistered {
        /// Owner type name.
        model: String,
    },

    /// Model is registered but the field is not.
    #[error("no attachment config found for field {field} in model {model}")]
    FieldNotRegistered {
        /// Owner type name.
        model: String,
        /// Field name.
        field: String,
    },

    /// File too large.
    #[error("file size {size} bytes exceeds maximum {max} bytes")]
    FileTooLarge {
        /// Actual file size.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// Extension not in the allow list.
    #[error("file extension {0} is not allowed")]
    ExtensionNotAllowed(String),

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Conversion failed.
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),

    /// No live attachment for the owner and field.
    #[error("attachment not found for {model}#{model_id} field {field}")]
    NotFound {
        /// Owner type name.
        model: String,
        /// Owner id.
        model_id: i64,
        /// Field name.
        field: String,
    },

    /// Provider does not offer listing.
    #[error("storage provider {0} does not support listing")]
    ListingUnsupported(String),
}

impl AttachmentError {
    /// Create a file too large error.
    #[must_use]
    pub fn file_too_large(size: u64, max: u64) -> Self {
        Self::FileTooLarge { size, max }
    }

    /// Create an extension not allowed error.
    #[must_use]
    pub fn extension_not_allowed(ext: impl Into<String>) -> Self {
        Self::ExtensionNotAllowed(ext.into())
    }

    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(model: impl Into<String>, model_id: i64, field: impl Into<String>) -> Self {
        Self::NotFound {
            model: model.into(),
            model_id,
            field: field.into(),
        }
    }

    /// Failure category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ModelNotRegistered { .. } | Self::FieldNotRegistered { .. } => ErrorKind::Config,
            Self::FileTooLarge { .. } | Self::ExtensionNotAllowed(_) => ErrorKind::Validation,
            Self::Storage(e) if e.is_construction() => ErrorKind::ProviderConstruction,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Storage(_) => ErrorKind::Upload,
            Self::Conversion(_) => ErrorKind::Conversion,
            Self::Repository(_) => ErrorKind::Persistence,
            Self::ListingUnsupported(_) => ErrorKind::ListingUnsupported,
        }
    }
}

impl From<AttachmentError> for AppError {
    fn from(err: AttachmentError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Config => Self::Configuration(message),
            ErrorKind::Validation => Self::Validation(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::ProviderConstruction | ErrorKind::Upload => Self::Storage(message),
            ErrorKind::Conversion => Self::Conversion(message),
            ErrorKind::Persistence => Self::Database(message),
            ErrorKind::ListingUnsupported => Self::Internal(message),
        }
    }
}
