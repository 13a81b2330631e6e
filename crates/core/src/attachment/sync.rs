//! Back-filling attachment rows from objects already in a remote bucket.

use std::future::Future;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::error::AttachmentError;
use super::repository::{AttachmentRepository, SettingsLookup};
use super::service::ActiveStorage;
use super::types::{AttachmentOwner, NewAttachment};
use crate::media::{MediaType, detect_media_type};
use crate::storage::RemoteObject;

/// A remote object that has no attachment row yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncObject {
    /// Full storage key.
    pub key: String,
    /// Key with the sync prefix removed.
    pub relative_key: String,
    /// Last path segment of the key.
    pub filename: String,
    /// Directory part of the relative key, empty at the top level.
    pub directory: String,
    /// Size in bytes.
    pub size: u64,
    /// Media type detected from the extension.
    pub media_type: MediaType,
}

impl SyncObject {
    fn new(object: &RemoteObject, prefix: &str) -> Self {
        let relative_key = object
            .key
            .strip_prefix(prefix)
            .unwrap_or(&object.key)
            .trim_start_matches('/')
            .to_string();
        let (directory, filename) = match relative_key.rsplit_once('/') {
            Some((dir, name)) => (dir.to_string(), name.to_string()),
            None => (String::new(), relative_key.clone()),
        };
        Self {
            key: object.key.clone(),
            media_type: detect_media_type(&filename),
            relative_key,
            filename,
            directory,
            size: object.size,
        }
    }
}

/// Creates the owner row for an object being synced.
pub trait SyncOwnerFactory: Send + Sync {
    /// Create (or find) the owner that the new attachment will belong to.
    fn create_owner(
        &self,
        object: &SyncObject,
    ) -> impl Future<Output = Result<AttachmentOwner, AttachmentError>> + Send;
}

/// Outcome of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    /// Objects listed under the prefix.
    pub total: usize,
    /// Objects that got a new attachment row.
    pub processed: usize,
    /// Folder markers and objects already attached.
    pub skipped: usize,
    /// Objects that failed; see `errors`.
    pub failed: usize,
    /// One message per failed object.
    pub errors: Vec<String>,
    /// Wall-clock duration of the run.
    pub duration: Duration,
}

impl<R: AttachmentRepository, S: SettingsLookup> ActiveStorage<R, S> {
    /// Create attachment rows for every object under `prefix` that no live
    /// attachment references yet.
    ///
    /// Per-object failures are collected in the result and do not stop the
    /// run.
    ///
    /// # Errors
    ///
    /// Fails if the provider cannot list objects or the listing itself fails.
    pub async fn sync_from_remote<F: SyncOwnerFactory>(
        &self,
        prefix: &str,
        field: &str,
        factory: &F,
    ) -> Result<SyncResult, AttachmentError> {
        let started = Instant::now();
        let listable = self
            .provider
            .as_listable()
            .ok_or_else(|| AttachmentError::ListingUnsupported(self.provider.name().to_string()))?;
        let objects = listable.list(prefix).await?;

        let mut result = SyncResult {
            total: objects.len(),
            ..SyncResult::default()
        };

        for object in &objects {
            if object.key.ends_with('/') {
                result.skipped += 1;
                continue;
            }
            let object = SyncObject::new(object, prefix);
            match self.sync_object(&object, field, factory).await {
                Ok(true) => result.processed += 1,
                Ok(false) => result.skipped += 1,
                Err(err) => {
                    result.failed += 1;
                    result.errors.push(format!("{}: {err}", object.relative_key));
                }
            }
        }

        result.duration = started.elapsed();
        tracing::info!(
            prefix,
            total = result.total,
            processed = result.processed,
            skipped = result.skipped,
            failed = result.failed,
            "remote sync finished"
        );
        Ok(result)
    }

    async fn sync_object<F: SyncOwnerFactory>(
        &self,
        object: &SyncObject,
        field: &str,
        factory: &F,
    ) -> Result<bool, AttachmentError> {
        if self.repo.exists_by_path(&object.key).await? {
            return Ok(false);
        }

        let owner = factory.create_owner(object).await?;
        self.repo
            .create(NewAttachment {
                model_type: owner.model_type,
                model_id: owner.model_id,
                field: field.to_string(),
                filename: object.filename.clone(),
                path: object.key.clone(),
                url: self.provider.get_url(&object.key),
                size: i64::try_from(object.size).unwrap_or(i64::MAX),
            })
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::NoSettings;
    use crate::attachment::service::tests::{
        MockAttachmentRepository, SpyProvider, pipeline_without_encoder,
    };
    use std::sync::Arc;
    use std::sync::Mutex;

    /// Hands out sequential owner ids and remembers what it saw.
    #[derive(Default)]
    struct MediaOwners {
        seen: Mutex<Vec<SyncObject>>,
    }

    impl SyncOwnerFactory for MediaOwners {
        async fn create_owner(
            &self,
            object: &SyncObject,
        ) -> Result<AttachmentOwner, AttachmentError> {
            if object.filename.starts_with("bad") {
                return Err(AttachmentError::repository("owner insert failed"));
            }
            let mut seen = self.seen.lock().unwrap();
            seen.push(object.clone());
            Ok(AttachmentOwner::new("media", seen.len() as i64))
        }
    }

    fn remote(key: &str, size: u64) -> RemoteObject {
        RemoteObject {
            key: key.to_string(),
            size,
        }
    }

    fn storage(
        provider: SpyProvider,
    ) -> (
        ActiveStorage<MockAttachmentRepository, NoSettings>,
        Arc<MockAttachmentRepository>,
    ) {
        let repo = Arc::new(MockAttachmentRepository::default());
        let storage = ActiveStorage::new(
            Arc::new(provider),
            pipeline_without_encoder(),
            repo.clone(),
            Arc::new(NoSettings),
        );
        (storage, repo)
    }

    #[test]
    fn test_sync_object_paths() {
        let object = SyncObject::new(&remote("uploads/2024/cats/tom.jpg", 10), "uploads");
        assert_eq!(object.relative_key, "2024/cats/tom.jpg");
        assert_eq!(object.directory, "2024/cats");
        assert_eq!(object.filename, "tom.jpg");
        assert_eq!(object.media_type, MediaType::Image);

        let object = SyncObject::new(&remote("song.mp3", 10), "");
        assert_eq!(object.directory, "");
        assert_eq!(object.media_type, MediaType::Audio);
    }

    #[tokio::test]
    async fn test_sync_creates_missing_rows() {
        let provider = SpyProvider {
            listable: true,
            ..SpyProvider::default()
        };
        *provider.listing.lock().unwrap() = vec![
            remote("uploads/", 0),
            remote("uploads/a.png", 100),
            remote("uploads/docs/b.pdf", 200),
            remote("uploads/bad.txt", 5),
        ];
        let (storage, repo) = storage(provider);
        let owners = MediaOwners::default();

        let result = storage
            .sync_from_remote("uploads", "file", &owners)
            .await
            .unwrap();

        assert_eq!(result.total, 4);
        assert_eq!(result.processed, 2);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.failed, 1);
        assert!(result.errors[0].starts_with("bad.txt:"));

        let rows = repo.attachments.lock().unwrap().clone();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].path, "uploads/docs/b.pdf");
        assert_eq!(rows[1].filename, "b.pdf");
        assert_eq!(rows[1].model_type, "media");
        assert_eq!(rows[1].field, "file");
        assert_eq!(rows[1].url, "https://cdn.test/uploads/docs/b.pdf");
        assert_eq!(rows[1].size, 200);
    }

    #[tokio::test]
    async fn test_sync_skips_already_attached() {
        let provider = SpyProvider {
            listable: true,
            ..SpyProvider::default()
        };
        *provider.listing.lock().unwrap() = vec![remote("uploads/a.png", 100)];
        let (storage, repo) = storage(provider);
        repo.create(NewAttachment {
            model_type: "media".into(),
            model_id: 1,
            field: "file".into(),
            filename: "a.png".into(),
            path: "uploads/a.png".into(),
            url: String::new(),
            size: 100,
        })
        .await
        .unwrap();

        let owners = MediaOwners::default();
        let result = storage
            .sync_from_remote("uploads", "file", &owners)
            .await
            .unwrap();

        assert_eq!(result.skipped, 1);
        assert_eq!(result.processed, 0);
        assert!(owners.seen.lock().unwrap().is_empty());
        assert_eq!(repo.live_count(), 1);
    }

    #[tokio::test]
    async fn test_sync_requires_listing() {
        let (storage, _) = storage(SpyProvider::default());
        let err = storage
            .sync_from_remote("", "file", &MediaOwners::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AttachmentError::ListingUnsupported(ref p) if p == "spy"));
    }
}
