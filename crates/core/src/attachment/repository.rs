//! Persistence and settings seams, implemented by the db crate.

use std::future::Future;

use super::error::AttachmentError;
use super::types::{Attachment, NewAttachment};

/// Setting key: convert images to WebP.
pub const SETTING_CONVERT_IMAGES: &str = "media_convert_images";
/// Setting key: convert video to WebM.
pub const SETTING_CONVERT_VIDEOS: &str = "media_convert_videos";
/// Setting key: convert audio to Opus.
pub const SETTING_CONVERT_AUDIO: &str = "media_convert_audio";
/// Setting key: WebP quality override.
pub const SETTING_WEBP_QUALITY: &str = "media_webp_quality";
/// Setting key: video CRF override.
pub const SETTING_VIDEO_CRF: &str = "media_video_crf";
/// Setting key: audio bitrate override.
pub const SETTING_AUDIO_BITRATE: &str = "media_audio_bitrate";

/// Repository trait for attachment persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
/// Every lookup only sees live (not soft-deleted) rows.
pub trait AttachmentRepository: Send + Sync {
    /// Insert a new attachment record.
    fn create(
        &self,
        input: NewAttachment,
    ) -> impl Future<Output = Result<Attachment, AttachmentError>> + Send;

    /// Find the newest live attachment for an owner and field.
    fn find_by_owner(
        &self,
        model_type: &str,
        model_id: i64,
        field: &str,
    ) -> impl Future<Output = Result<Option<Attachment>, AttachmentError>> + Send;

    /// Check whether a live attachment references `path`.
    fn exists_by_path(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<bool, AttachmentError>> + Send;

    /// Delete attachment by ID. Returns whether a live row was removed.
    fn delete(&self, id: i64) -> impl Future<Output = Result<bool, AttachmentError>> + Send;
}

/// Read access to the collaborator-owned key/value settings.
///
/// `Ok(None)` means the setting is absent.
pub trait SettingsLookup: Send + Sync {
    /// Read a boolean setting.
    fn get_bool(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<bool>, AttachmentError>> + Send;

    /// Read an integer setting.
    fn get_int(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<i64>, AttachmentError>> + Send;
}

/// Settings source with nothing configured, so every default applies.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSettings;

impl SettingsLookup for NoSettings {
    async fn get_bool(&self, _key: &str) -> Result<Option<bool>, AttachmentError> {
        Ok(None)
    }

    async fn get_int(&self, _key: &str) -> Result<Option<i64>, AttachmentError> {
        Ok(None)
    }
}
