//! OpenDAL plumbing shared by the S3 and R2 providers.

use bytes::Bytes;
use opendal::{Operator, services};

use super::error::StorageError;
use super::provider::{RemoteObject, UploadResult, object_key, unique_filename};

/// Credentials and addressing for an S3-compatible bucket.
pub(crate) struct BucketSpec<'a> {
    pub endpoint: &'a str,
    pub bucket: &'a str,
    pub access_key_id: &'a str,
    pub secret_access_key: &'a str,
    pub region: &'a str,
}

/// An S3-compatible bucket reached through OpenDAL with path-style addressing.
#[derive(Debug, Clone)]
pub(crate) struct ObjectStore {
    operator: Operator,
}

impl ObjectStore {
    pub(crate) fn connect(backend: &str, spec: &BucketSpec<'_>) -> Result<Self, StorageError> {
        if spec.access_key_id.is_empty() || spec.secret_access_key.is_empty() {
            return Err(StorageError::configuration(format!(
                "{backend} requires an access key id and secret"
            )));
        }
        if spec.bucket.is_empty() {
            return Err(StorageError::configuration(format!("{backend} requires a bucket")));
        }

        let builder = services::S3::default()
            .endpoint(spec.endpoint)
            .bucket(spec.bucket)
            .access_key_id(spec.access_key_id)
            .secret_access_key(spec.secret_access_key)
            .region(spec.region)
            .disable_config_load()
            .disable_ec2_metadata();

        let operator = Operator::new(builder)
            .map_err(|e| {
                StorageError::configuration(format!("failed to create {backend} client: {e}"))
            })?
            .finish();

        Ok(Self { operator })
    }

    /// Write `data` under a unique name derived from `filename`.
    pub(crate) async fn put(
        &self,
        upload_path: &str,
        filename: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<UploadResult, StorageError> {
        let unique = unique_filename(filename);
        let key = object_key(upload_path, &unique);
        let size = data.len() as u64;

        let written = match content_type {
            Some(ct) => self.operator.write_with(&key, data).content_type(ct).await,
            None => self.operator.write(&key, data).await,
        };
        written.map_err(|e| StorageError::upload(&key, e))?;

        Ok(UploadResult {
            filename: unique,
            path: key,
            size,
        })
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.operator
            .delete(path)
            .await
            .map_err(|e| StorageError::delete(path, e))
    }

    /// Recursively list keys starting with `prefix`, folder markers included.
    pub(crate) async fn list(&self, prefix: &str) -> Result<Vec<RemoteObject>, StorageError> {
        let (dir, key_prefix) = list_scope(prefix);

        let entries = self
            .operator
            .list_with(dir)
            .recursive(true)
            .await
            .map_err(|e| StorageError::list(prefix, e))?;

        Ok(entries
            .into_iter()
            .filter(|entry| entry.path().starts_with(key_prefix))
            .map(|entry| RemoteObject {
                key: entry.path().to_string(),
                size: entry.metadata().content_length(),
            })
            .collect())
    }
}

/// Split a raw key prefix into the directory to walk and the prefix every
/// returned key must start with. `uploads/2024-` walks `uploads/`.
fn list_scope(prefix: &str) -> (&str, &str) {
    let key_prefix = prefix.trim_start_matches('/');
    let dir = match key_prefix.rfind('/') {
        Some(end) => &key_prefix[..=end],
        None => "/",
    };
    (dir, key_prefix)
}

/// Content type for bytes we produced ourselves, keyed on the extension.
pub(crate) fn converted_content_type(filename: &str) -> &'static str {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".webp") {
        "image/webp"
    } else if lower.ends_with(".webm") {
        "video/webm"
    } else {
        "application/octet-stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("photo.webp", "image/webp")]
    #[case("PHOTO.WEBP", "image/webp")]
    #[case("clip.webm", "video/webm")]
    #[case("voice.opus", "application/octet-stream")]
    #[case("noext", "application/octet-stream")]
    fn test_converted_content_type(#[case] filename: &str, #[case] expected: &str) {
        assert_eq!(converted_content_type(filename), expected);
    }

    #[rstest]
    #[case("", "/", "")]
    #[case("uploads", "/", "uploads")]
    #[case("uploads/", "uploads/", "uploads/")]
    #[case("uploads/2024-", "uploads/", "uploads/2024-")]
    #[case("/media/files/img", "media/files/", "media/files/img")]
    fn test_list_scope(#[case] prefix: &str, #[case] dir: &str, #[case] key_prefix: &str) {
        assert_eq!(list_scope(prefix), (dir, key_prefix));
    }

    #[rstest]
    #[case("", "secret", "bucket")]
    #[case("key", "", "bucket")]
    #[case("key", "secret", "")]
    fn test_connect_requires_credentials_and_bucket(
        #[case] key: &str,
        #[case] secret: &str,
        #[case] bucket: &str,
    ) {
        let spec = BucketSpec {
            endpoint: "https://s3.amazonaws.com",
            bucket,
            access_key_id: key,
            secret_access_key: secret,
            region: "us-east-1",
        };
        let err = ObjectStore::connect("S3", &spec).unwrap_err();
        assert!(err.is_construction());
    }
}
