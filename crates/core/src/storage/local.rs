//! Local filesystem provider.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use opendal::{Operator, services};

use super::config::UploadConfig;
use super::error::StorageError;
use super::provider::{StorageProvider, UploadFile, UploadResult, object_key, unique_filename};

/// Stores files under a filesystem root and serves them under a base URL.
#[derive(Debug, Clone)]
pub struct LocalProvider {
    operator: Operator,
    root: PathBuf,
    base_url: String,
}

impl LocalProvider {
    /// Create a provider rooted at `root`.
    ///
    /// A relative root is resolved against the current working directory
    /// once, here; the directory is created if missing.
    pub fn new(root: impl AsRef<Path>, base_url: impl Into<String>) -> Result<Self, StorageError> {
        let root = std::path::absolute(root.as_ref()).map_err(|e| {
            StorageError::configuration(format!(
                "failed to resolve storage root {}: {e}",
                root.as_ref().display()
            ))
        })?;
        std::fs::create_dir_all(&root).map_err(|e| {
            StorageError::configuration(format!(
                "failed to create storage root {}: {e}",
                root.display()
            ))
        })?;

        let builder = services::Fs::default().root(
            root.to_str()
                .ok_or_else(|| StorageError::configuration("storage root is not valid UTF-8"))?,
        );
        let operator = Operator::new(builder)
            .map_err(|e| StorageError::configuration(e.to_string()))?
            .finish();

        Ok(Self {
            operator,
            root,
            base_url: base_url.into(),
        })
    }

    /// Absolute filesystem root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn write(
        &self,
        data: Bytes,
        filename: &str,
        config: &UploadConfig,
    ) -> Result<UploadResult, StorageError> {
        let unique = unique_filename(filename);
        let key = object_key(&config.upload_path, &unique);
        let size = data.len() as u64;

        self.operator
            .write(&key, data)
            .await
            .map_err(|e| StorageError::upload(&key, e))?;

        Ok(UploadResult {
            filename: unique,
            path: key,
            size,
        })
    }
}

#[async_trait]
impl StorageProvider for LocalProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn upload(
        &self,
        file: &UploadFile,
        config: &UploadConfig,
    ) -> Result<UploadResult, StorageError> {
        self.write(file.data.clone(), &file.filename, config).await
    }

    async fn upload_bytes(
        &self,
        data: Bytes,
        filename: &str,
        config: &UploadConfig,
    ) -> Result<UploadResult, StorageError> {
        self.write(data, filename, config).await
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.operator
            .delete(path)
            .await
            .map_err(|e| StorageError::delete(path, e))
    }

    fn get_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn provider(dir: &TempDir) -> LocalProvider {
        LocalProvider::new(dir.path(), "/storage").expect("should create provider")
    }

    #[test]
    fn test_get_url_joins_base_url() {
        let dir = TempDir::new().unwrap();
        let provider = provider(&dir);
        assert_eq!(
            provider.get_url("media/files/abc123.png"),
            "/storage/media/files/abc123.png"
        );
        assert_eq!(
            provider.get_url("/media/files/abc123.png"),
            "/storage/media/files/abc123.png"
        );
    }

    #[test]
    fn test_get_url_trailing_slash_base() {
        let dir = TempDir::new().unwrap();
        let provider = LocalProvider::new(dir.path(), "https://files.example.com/").unwrap();
        assert_eq!(
            provider.get_url("a/b.png"),
            "https://files.example.com/a/b.png"
        );
    }

    #[test]
    fn test_root_is_absolute() {
        let dir = TempDir::new().unwrap();
        let provider = provider(&dir);
        assert!(provider.root().is_absolute());
    }

    #[tokio::test]
    async fn test_upload_writes_under_upload_path() {
        let dir = TempDir::new().unwrap();
        let provider = provider(&dir);
        let file = UploadFile::new("avatar.png", b"png-bytes".to_vec());

        let result = provider
            .upload(&file, &UploadConfig::new("media/files/profile/avatar"))
            .await
            .expect("upload should succeed");

        assert!(result.path.starts_with("media/files/profile/avatar/avatar_"));
        assert!(result.filename.ends_with(".png"));
        assert_eq!(result.size, 9);

        let on_disk = std::fs::read(dir.path().join(&result.path)).unwrap();
        assert_eq!(on_disk, b"png-bytes");
    }

    #[tokio::test]
    async fn test_upload_same_name_twice_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let provider = provider(&dir);
        let config = UploadConfig::new("docs");

        let first = provider
            .upload_bytes(Bytes::from_static(b"one"), "a.txt", &config)
            .await
            .unwrap();
        let second = provider
            .upload_bytes(Bytes::from_static(b"two"), "a.txt", &config)
            .await
            .unwrap();

        assert_ne!(first.path, second.path);
        assert_eq!(std::fs::read(dir.path().join(&first.path)).unwrap(), b"one");
        assert_eq!(std::fs::read(dir.path().join(&second.path)).unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_delete_removes_file() {
        let dir = TempDir::new().unwrap();
        let provider = provider(&dir);
        let result = provider
            .upload_bytes(Bytes::from_static(b"data"), "del.txt", &UploadConfig::new("tmp"))
            .await
            .unwrap();

        provider.delete(&result.path).await.expect("delete should succeed");
        assert!(!dir.path().join(&result.path).exists());
    }
}
