//! The `ActiveStorage` orchestrator.

use std::sync::Arc;

use stowage_shared::MediaSettings;

use super::error::AttachmentError;
use super::registry::AttachmentRegistry;
use super::repository::{
    AttachmentRepository, SETTING_AUDIO_BITRATE, SETTING_CONVERT_AUDIO, SETTING_CONVERT_IMAGES,
    SETTING_CONVERT_VIDEOS, SETTING_VIDEO_CRF, SETTING_WEBP_QUALITY, SettingsLookup,
};
use super::types::{Attachable, Attachment, AttachmentConfig, NewAttachment};
use crate::media::{ConversionOptions, MediaPipeline, extension, should_convert};
use crate::storage::{ProviderConfig, StorageProvider, UploadConfig, UploadFile, build_provider};

/// Binds uploaded blobs to attachment rows.
///
/// Owns one storage provider, the conversion pipeline, the upload policy
/// registry and the repository. Nothing is retried; every failure is
/// returned to the caller.
pub struct ActiveStorage<R: AttachmentRepository, S: SettingsLookup> {
    pub(super) provider: Arc<dyn StorageProvider>,
    pipeline: MediaPipeline,
    registry: AttachmentRegistry,
    pub(super) repo: Arc<R>,
    settings: Arc<S>,
}

impl<R: AttachmentRepository, S: SettingsLookup> ActiveStorage<R, S> {
    /// Create an orchestrator around an already-built provider.
    #[must_use]
    pub fn new(
        provider: Arc<dyn StorageProvider>,
        pipeline: MediaPipeline,
        repo: Arc<R>,
        settings: Arc<S>,
    ) -> Self {
        Self {
            provider,
            pipeline,
            registry: AttachmentRegistry::new(),
            repo,
            settings,
        }
    }

    /// Build the provider from configuration and create the orchestrator.
    ///
    /// # Errors
    ///
    /// Fails if the provider cannot be constructed (missing credentials,
    /// bucket or account id).
    pub fn from_config(
        provider: &ProviderConfig,
        media: &MediaSettings,
        repo: Arc<R>,
        settings: Arc<S>,
    ) -> Result<Self, AttachmentError> {
        Ok(Self::new(
            build_provider(provider)?,
            MediaPipeline::from_settings(media),
            repo,
            settings,
        ))
    }

    /// Register (or replace) the upload policy for `model`/`config.field`.
    pub fn register_attachment(&self, model: &str, config: AttachmentConfig) {
        self.registry.register(model, config);
    }

    /// Upload policy registry.
    #[must_use]
    pub fn registry(&self) -> &AttachmentRegistry {
        &self.registry
    }

    /// Underlying provider, for bulk tooling.
    #[must_use]
    pub fn provider(&self) -> Arc<dyn StorageProvider> {
        Arc::clone(&self.provider)
    }

    /// Validate, convert, upload and persist `file` as `owner.field`.
    ///
    /// Config lookup and validation happen before any conversion or upload.
    /// If persisting the row fails the uploaded blob is deleted on a best
    /// effort basis and the persistence error is returned.
    ///
    /// # Errors
    ///
    /// Returns the first failure: config, validation, conversion, upload or
    /// persistence.
    pub async fn attach<O: Attachable + ?Sized>(
        &self,
        owner: &O,
        field: &str,
        file: UploadFile,
    ) -> Result<Attachment, AttachmentError> {
        let model = owner.model_name();
        let config = self.registry.get(model, field)?;
        validate(&config, &file)?;

        let options = if should_convert(&file.filename) {
            self.conversion_options().await
        } else {
            ConversionOptions::disabled()
        };
        let converted = self
            .pipeline
            .convert(&file.data, &file.filename, &options)
            .await?;

        let upload_config = UploadConfig {
            upload_path: config.upload_path(model),
            allowed_extensions: config.allowed_extensions.clone(),
            max_file_size: config.max_file_size,
        };
        let result = match converted {
            Some(converted) => {
                tracing::debug!(
                    from = %file.filename,
                    to = %converted.filename,
                    "uploading converted file"
                );
                self.provider
                    .upload_bytes(converted.data, &converted.filename, &upload_config)
                    .await?
            }
            None => self.provider.upload(&file, &upload_config).await?,
        };

        let record = NewAttachment {
            model_type: model.to_string(),
            model_id: owner.model_id(),
            field: field.to_string(),
            filename: result.filename,
            url: self.provider.get_url(&result.path),
            path: result.path,
            size: i64::try_from(result.size).unwrap_or(i64::MAX),
        };
        let path = record.path.clone();

        match self.repo.create(record).await {
            Ok(attachment) => {
                tracing::info!(
                    model,
                    model_id = attachment.model_id,
                    field,
                    path = %attachment.path,
                    size = attachment.size,
                    "attachment stored"
                );
                Ok(attachment)
            }
            Err(err) => {
                if let Err(cleanup) = self.provider.delete(&path).await {
                    tracing::warn!(
                        path = %path,
                        error = %cleanup,
                        "failed to remove blob after persistence failure"
                    );
                }
                Err(err)
            }
        }
    }

    /// Delete the blob, then the row.
    ///
    /// A failed blob delete leaves the row untouched.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the blob delete fails, a repository error
    /// if the row delete fails, or not found if no live row matched.
    pub async fn delete(&self, attachment: &Attachment) -> Result<(), AttachmentError> {
        self.provider.delete(&attachment.path).await?;

        if !self.repo.delete(attachment.id).await? {
            return Err(AttachmentError::not_found(
                &attachment.model_type,
                attachment.model_id,
                &attachment.field,
            ));
        }

        tracing::info!(
            model = %attachment.model_type,
            model_id = attachment.model_id,
            field = %attachment.field,
            path = %attachment.path,
            "attachment deleted"
        );
        Ok(())
    }

    /// Load the live attachment for `owner.field` with a freshly resolved URL.
    ///
    /// # Errors
    ///
    /// Returns not found when no live row matches.
    pub async fn load_attachment<O: Attachable + ?Sized>(
        &self,
        owner: &O,
        field: &str,
    ) -> Result<Attachment, AttachmentError> {
        let model = owner.model_name();
        let mut attachment = self
            .repo
            .find_by_owner(model, owner.model_id(), field)
            .await?
            .ok_or_else(|| AttachmentError::not_found(model, owner.model_id(), field))?;
        attachment.url = self.provider.get_url(&attachment.path);
        Ok(attachment)
    }

    /// Replace the attachment in `owner.field` with `file`.
    ///
    /// The new file is attached first and the current one (if any) is
    /// deleted afterwards, so a failed conversion or upload leaves the
    /// current attachment in place. If the current blob cannot be deleted the
    /// new attachment is rolled back and the storage error returned.
    ///
    /// # Errors
    ///
    /// Any error from [`Self::attach`], or a storage error from deleting the
    /// current blob.
    pub async fn replace<O: Attachable + ?Sized>(
        &self,
        owner: &O,
        field: &str,
        file: UploadFile,
    ) -> Result<Attachment, AttachmentError> {
        let current = match self.load_attachment(owner, field).await {
            Ok(current) => Some(current),
            Err(AttachmentError::NotFound { .. }) => None,
            Err(err) => return Err(err),
        };

        let attached = self.attach(owner, field, file).await?;
        let Some(current) = current else {
            return Ok(attached);
        };

        match self.delete(&current).await {
            Ok(()) | Err(AttachmentError::NotFound { .. }) => Ok(attached),
            Err(err @ AttachmentError::Storage(_)) => {
                if let Err(rollback) = self.delete(&attached).await {
                    tracing::warn!(
                        path = %attached.path,
                        error = %rollback,
                        "failed to roll back replacement attachment"
                    );
                }
                Err(err)
            }
            Err(err) => {
                // Blob is gone; the newer row already wins lookups.
                tracing::warn!(
                    id = current.id,
                    error = %err,
                    "previous attachment row not removed after replace"
                );
                Ok(attached)
            }
        }
    }

    async fn conversion_options(&self) -> ConversionOptions {
        ConversionOptions {
            images: self.flag(SETTING_CONVERT_IMAGES).await,
            videos: self.flag(SETTING_CONVERT_VIDEOS).await,
            audio: self.flag(SETTING_CONVERT_AUDIO).await,
            webp_quality: self.int(SETTING_WEBP_QUALITY).await,
            video_crf: self.int(SETTING_VIDEO_CRF).await,
            audio_bitrate: self.int(SETTING_AUDIO_BITRATE).await,
        }
    }

    /// Conversion is opt-out: absent or unreadable flags count as enabled.
    async fn flag(&self, key: &str) -> bool {
        match self.settings.get_bool(key).await {
            Ok(value) => value.unwrap_or(true),
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to read setting, defaulting to enabled");
                true
            }
        }
    }

    async fn int(&self, key: &str) -> Option<i64> {
        match self.settings.get_int(key).await {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to read setting, using configured default");
                None
            }
        }
    }
}

fn validate(config: &AttachmentConfig, file: &UploadFile) -> Result<(), AttachmentError> {
    let size = file.size();
    if !config.allows_size(size) {
        return Err(AttachmentError::file_too_large(size, config.max_file_size));
    }
    if !config.allows_extension(&file.filename) {
        return Err(AttachmentError::extension_not_allowed(extension(
            &file.filename,
        )));
    }
    Ok(())
}
