//! Cloudflare R2 provider.

use async_trait::async_trait;
use bytes::Bytes;

use super::config::UploadConfig;
use super::error::StorageError;
use super::object_store::{BucketSpec, ObjectStore, converted_content_type};
use super::provider::{
    ListableProvider, RemoteObject, StorageProvider, UploadFile, UploadResult,
};

/// R2 bucket. URLs resolve with precedence CDN > base URL > raw endpoint.
#[derive(Debug, Clone)]
pub struct R2Provider {
    store: ObjectStore,
    endpoint: String,
    bucket: String,
    base_url: String,
    cdn: String,
}

impl R2Provider {
    /// Create a provider for `bucket` in the given Cloudflare account.
    pub fn new(
        account_id: &str,
        bucket: &str,
        access_key_id: &str,
        secret_access_key: &str,
        base_url: &str,
        cdn: &str,
    ) -> Result<Self, StorageError> {
        if account_id.trim().is_empty() {
            return Err(StorageError::configuration("R2 requires an account id"));
        }
        let endpoint = format!("https://{}.r2.cloudflarestorage.com", account_id.trim());

        let store = ObjectStore::connect(
            "R2",
            &BucketSpec {
                endpoint: &endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region: "auto",
            },
        )?;

        Ok(Self {
            store,
            endpoint,
            bucket: bucket.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            cdn: cdn.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl StorageProvider for R2Provider {
    fn name(&self) -> &'static str {
        "r2"
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
        let path = path.trim_start_matches('/');
        if !self.cdn.is_empty() {
            return format!("{}/{path}", self.cdn);
        }
        if !self.base_url.is_empty() {
            return format!("{}/{path}", self.base_url);
        }
        format!("{}/{}/{path}", self.endpoint, self.bucket)
    }

    fn as_listable(&self) -> Option<&dyn ListableProvider> {
        Some(self)
    }
}

#[async_trait]
impl ListableProvider for R2Provider {
    async fn list(&self, prefix: &str) -> Result<Vec<RemoteObject>, StorageError> {
        self.store.list(prefix).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://cdn.example.com/", "https://files.example.com", "https://cdn.example.com/a/b.webp")]
    #[case("", "https://files.example.com/", "https://files.example.com/a/b.webp")]
    #[case("", "", "https://acct.r2.cloudflarestorage.com/media/a/b.webp")]
    fn test_get_url_precedence(#[case] cdn: &str, #[case] base_url: &str, #[case] expected: &str) {
        let provider = R2Provider::new("acct", "media", "key", "secret", base_url, cdn).unwrap();
        assert_eq!(provider.get_url("a/b.webp"), expected);
    }

    #[test]
    fn test_requires_account_id() {
        let err = R2Provider::new("", "media", "key", "secret", "", "").unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));
    }

    #[test]
    fn test_requires_bucket() {
        let err = R2Provider::new("acct", "", "key", "secret", "", "").unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));
    }

    #[test]
    fn test_name_and_listable() {
        let provider = R2Provider::new("acct", "media", "key", "secret", "", "").unwrap();
        assert_eq!(provider.name(), "r2");
        assert!(provider.as_listable().is_some());
    }
}
