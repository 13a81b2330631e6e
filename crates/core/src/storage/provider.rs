//! Provider contract shared by every storage backend.

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use super::config::UploadConfig;
use super::error::StorageError;

/// A file received from a collaborator, typically a multipart form part.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Client-supplied filename.
    pub filename: String,
    /// Client-supplied content type, if any.
    pub content_type: Option<String>,
    /// File contents.
    pub data: Bytes,
}

impl UploadFile {
    /// Create an upload from a filename and its contents.
    #[must_use]
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            data: data.into(),
        }
    }

    /// Attach the client-supplied content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Where a provider put an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// Unique filename the object was stored as.
    pub filename: String,
    /// Provider-specific storage key.
    pub path: String,
    /// Stored size in bytes.
    pub size: u64,
}

/// An object found while listing a remote bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    /// Full storage key.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
}

/// Blob storage backend.
///
/// Uploads never overwrite: every upload is stored under a freshly generated
/// unique filename inside `UploadConfig::upload_path`.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Backend name: `local`, `s3` or `r2`.
    fn name(&self) -> &'static str;

    /// Store a collaborator-supplied file.
    async fn upload(
        &self,
        file: &UploadFile,
        config: &UploadConfig,
    ) -> Result<UploadResult, StorageError>;

    /// Store bytes produced in memory, e.g. after conversion.
    async fn upload_bytes(
        &self,
        data: Bytes,
        filename: &str,
        config: &UploadConfig,
    ) -> Result<UploadResult, StorageError>;

    /// Remove a stored object.
    async fn delete(&self, path: &str) -> Result<(), StorageError>;

    /// Resolve a storage key to a public URL using the current configuration.
    fn get_url(&self, path: &str) -> String;

    /// Listing capability, only offered by object-store backends.
    fn as_listable(&self) -> Option<&dyn ListableProvider> {
        None
    }
}

/// Capability for backends that can enumerate their objects.
#[async_trait]
pub trait ListableProvider: Send + Sync {
    /// List every object whose key starts with `prefix`. The prefix is a raw
    /// key prefix, not a directory: `uploads/2024-` matches
    /// `uploads/2024-01.png`.
    async fn list(&self, prefix: &str) -> Result<Vec<RemoteObject>, StorageError>;
}

/// Sanitize a filename for use inside a storage key.
///
/// Only ASCII alphanumeric characters, dots, hyphens and underscores survive;
/// everything else becomes `_`.
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Generate a collision-resistant filename that keeps the original stem and
/// extension: `photo.png` becomes `photo_<token>.png`.
#[must_use]
pub fn unique_filename(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let (stem, ext) = match base.rfind('.') {
        Some(idx) if idx > 0 => (&base[..idx], &base[idx..]),
        _ => (base, ""),
    };
    let stem = sanitize_filename(stem);
    let stem = if stem.is_empty() { "file" } else { stem.as_str() };
    let token = Uuid::now_v7().simple();

    format!("{stem}_{token}{}", sanitize_filename(ext))
}

/// Join an upload path and a filename into a storage key.
#[must_use]
pub fn object_key(upload_path: &str, filename: &str) -> String {
    let prefix = upload_path.trim_matches('/');
    if prefix.is_empty() {
        filename.to_string()
    } else {
        format!("{prefix}/{filename}")
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    // A generated name never escapes its upload path.
    proptest! {
        #[test]
        fn prop_unique_filename_safe_chars(filename in ".*") {
            let name = unique_filename(&filename);
            for c in name.chars() {
                let is_safe = c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_';
                prop_assert!(is_safe, "Unexpected character in generated filename: {}", c);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_unique_filename_preserves_extension(
            stem in "[a-zA-Z0-9_-]{1,30}",
            ext in "[a-z0-9]{1,5}",
        ) {
            let name = unique_filename(&format!("{stem}.{ext}"));
            let expected_suffix = format!(".{ext}");
            let expected_prefix = format!("{stem}_");
            prop_assert!(name.ends_with(&expected_suffix));
            prop_assert!(name.starts_with(&expected_prefix));
        }
    }
}
