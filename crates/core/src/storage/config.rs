//! Storage configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use stowage_shared::StorageSettings;

use super::error::StorageError;

/// Default S3 endpoint host when none is configured.
pub(crate) const DEFAULT_S3_ENDPOINT: &str = "s3.amazonaws.com";
/// Default S3 region when none is configured.
pub(crate) const DEFAULT_S3_REGION: &str = "us-east-1";

/// Storage provider configuration.
///
/// Immutable once the provider is built; there is no runtime switching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Local filesystem.
    Local {
        /// Root directory (relative roots resolve against the working directory).
        root: PathBuf,
        /// Public URL prefix for stored files.
        base_url: String,
    },
    /// S3-compatible storage with path-style addressing.
    S3 {
        /// Endpoint host, with or without scheme.
        endpoint: String,
        /// Bucket name.
        bucket: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Region.
        region: String,
    },
    /// Cloudflare R2.
    R2 {
        /// Cloudflare account id, used to derive the endpoint.
        account_id: String,
        /// Bucket name.
        bucket: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Public URL prefix, used when no CDN is configured.
        base_url: String,
        /// CDN prefix, preferred over everything else.
        cdn: String,
    },
}

impl ProviderConfig {
    /// Create a local filesystem provider config.
    #[must_use]
    pub fn local(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self::Local {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    /// Create an S3 provider config.
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Create a Cloudflare R2 provider config.
    #[must_use]
    pub fn r2(
        account_id: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        base_url: impl Into<String>,
        cdn: impl Into<String>,
    ) -> Self {
        Self::R2 {
            account_id: account_id.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            base_url: base_url.into(),
            cdn: cdn.into(),
        }
    }

    /// Translate loaded settings into a typed provider config.
    ///
    /// The selector is matched case-insensitively. The single key pair in the
    /// settings (`api_key` / `api_secret`) feeds both object-store backends.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnsupportedProvider`] for an unknown selector.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        match settings.provider.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::local(&settings.path, &settings.base_url)),
            "s3" => Ok(Self::s3(
                &settings.endpoint,
                &settings.bucket,
                &settings.api_key,
                &settings.api_secret,
                &settings.region,
            )),
            "r2" => Ok(Self::r2(
                &settings.account_id,
                &settings.bucket,
                &settings.api_key,
                &settings.api_secret,
                &settings.base_url,
                &settings.cdn,
            )),
            _ => Err(StorageError::unsupported_provider(&settings.provider)),
        }
    }

    /// Get the provider name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Local { .. } => "local",
            Self::S3 { .. } => "s3",
            Self::R2 { .. } => "r2",
        }
    }
}

/// Per-upload settings handed to a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadConfig {
    /// Key prefix the object is stored under.
    pub upload_path: String,
    /// Allowed extensions (with leading dot), informational for providers.
    pub allowed_extensions: Vec<String>,
    /// Maximum size in bytes, informational for providers.
    pub max_file_size: u64,
}

impl UploadConfig {
    /// Create an upload config for the given key prefix.
    #[must_use]
    pub fn new(upload_path: impl Into<String>) -> Self {
        Self {
            upload_path: upload_path.into(),
            ..Self::default()
        }
    }
}
