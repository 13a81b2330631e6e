//! S3-compatible provider.

use async_trait::async_trait;
use bytes::Bytes;

use super::config::{DEFAULT_S3_ENDPOINT, DEFAULT_S3_REGION, UploadConfig};
use super::error::StorageError;
use super::object_store::{BucketSpec, ObjectStore, converted_content_type};
use super::provider::{
    ListableProvider, RemoteObject, StorageProvider, UploadFile, UploadResult,
};

/// Path-style S3 bucket; URLs are `https://{endpoint}/{bucket}/{key}`.
#[derive(Debug, Clone)]
pub struct S3Provider {
    store: ObjectStore,
    endpoint_host: String,
    bucket: String,
}

impl S3Provider {
    /// Create a provider. Empty endpoint and region fall back to AWS defaults.
    pub fn new(
        endpoint: &str,
        bucket: &str,
        access_key_id: &str,
        secret_access_key: &str,
        region: &str,
    ) -> Result<Self, StorageError> {
        let endpoint_host = match strip_scheme(endpoint) {
            "" => DEFAULT_S3_ENDPOINT,
            host => host,
        }
        .to_string();
        let region = if region.is_empty() {
            DEFAULT_S3_REGION
        } else {
            region
        };

        let store = ObjectStore::connect(
            "S3",
            &BucketSpec {
                endpoint: &with_scheme(endpoint, &endpoint_host),
                bucket,
                access_key_id,
                secret_access_key,
                region,
            },
        )?;

        Ok(Self {
            store,
            endpoint_host,
            bucket: bucket.to_string(),
        })
    }
}

#[async_trait]
impl StorageProvider for S3Provider {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn upload(
        &self,
        file: &UploadFile,
        config: &UploadConfig,
    ) -> Result<UploadResult, StorageError> {
        self.store
            .put(
                &config.upload_path,
                &file.filename,
                file.data.clone(),
                file.content_type.as_deref(),
            )
            .await
    }

    async fn upload_bytes(
        &self,
        data: Bytes,
        filename: &str,
        config: &UploadConfig,
    ) -> Result<UploadResult, StorageError> {
        self.store
            .put(
                &config.upload_path,
                filename,
                data,
                Some(converted_content_type(filename)),
            )
            .await
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.store.delete(path).await
    }

    fn get_url(&self, path: &str) -> String {
        format!(
            "https://{}/{}/{}",
            self.endpoint_host,
            self.bucket,
            path.trim_start_matches('/')
        )
    }

    fn as_listable(&self) -> Option<&dyn ListableProvider> {
        Some(self)
    }
}

#[async_trait]
impl ListableProvider for S3Provider {
    async fn list(&self, prefix: &str) -> Result<Vec<RemoteObject>, StorageError> {
        self.store.list(prefix).await
    }
}

fn strip_scheme(endpoint: &str) -> &str {
    endpoint
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
}

/// Keep an explicit `http://` endpoint (local MinIO), default to https.
fn with_scheme(configured: &str, host: &str) -> String {
    if configured.trim().starts_with("http://") {
        format!("http://{host}")
    } else {
        format!("https://{host}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(endpoint: &str) -> S3Provider {
        S3Provider::new(endpoint, "media", "key", "secret", "").expect("should build")
    }

    #[test]
    fn test_get_url_path_style() {
        let provider = provider("s3.eu-west-1.amazonaws.com");
        assert_eq!(
            provider.get_url("media/files/abc.png"),
            "https://s3.eu-west-1.amazonaws.com/media/media/files/abc.png"
        );
    }

    #[test]
    fn test_get_url_default_endpoint() {
        let provider = provider("");
        assert_eq!(
            provider.get_url("a.png"),
            "https://s3.amazonaws.com/media/a.png"
        );
    }

    #[test]
    fn test_get_url_strips_scheme() {
        let provider = provider("http://localhost:9000/");
        assert_eq!(
            provider.get_url("a.png"),
            "https://localhost:9000/media/a.png"
        );
    }

    #[test]
    fn test_get_url_is_pure() {
        let provider = provider("s3.amazonaws.com");
        assert_eq!(provider.get_url("x/y.png"), provider.get_url("x/y.png"));
    }

    #[test]
    fn test_missing_credentials_fail_fast() {
        let err = S3Provider::new("", "media", "", "", "us-east-1").unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));
    }

    #[test]
    fn test_is_listable() {
        let provider = provider("");
        assert_eq!(provider.name(), "s3");
        assert!(provider.as_listable().is_some());
    }
}
