//! Attachment types and data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::media::extension;

/// Size cap applied when a config does not set one: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Anything that can own attachments.
///
/// Ownership is the `(model_name, model_id, field)` triple; owners never hold
/// a reference to their attachment rows.
pub trait Attachable {
    /// Logical type name stored in `model_type`, e.g. `"profile"`.
    fn model_name(&self) -> &str;

    /// Numeric id of the owner row.
    fn model_id(&self) -> i64;
}

/// Plain owner handle, for callers that only have the type name and id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachmentOwner {
    /// Logical type name.
    pub model_type: String,
    /// Owner id.
    pub model_id: i64,
}

impl AttachmentOwner {
    /// Create an owner handle.
    #[must_use]
    pub fn new(model_type: impl Into<String>, model_id: i64) -> Self {
        Self {
            model_type: model_type.into(),
            model_id,
        }
    }
}

impl Attachable for AttachmentOwner {
    fn model_name(&self) -> &str {
        &self.model_type
    }

    fn model_id(&self) -> i64 {
        self.model_id
    }
}

/// Upload policy for one `(model, field)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentConfig {
    /// Field name on the owner.
    pub field: String,
    /// Storage sub-path; uploads go to `{path}/{model}/{field}`.
    pub path: String,
    /// Allowed extensions with leading dot, compared case-insensitively.
    /// Empty allows every extension.
    pub allowed_extensions: Vec<String>,
    /// Maximum size in bytes, inclusive. Zero rejects every non-empty file.
    pub max_file_size: u64,
    /// Reserved; a field currently holds a single attachment.
    pub multiple: bool,
}

impl AttachmentConfig {
    /// Create a config for `field` stored under `path`, capped at
    /// [`DEFAULT_MAX_FILE_SIZE`].
    #[must_use]
    pub fn new(field: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            path: path.into(),
            allowed_extensions: Vec::new(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            multiple: false,
        }
    }

    /// Set the allowed extensions.
    #[must_use]
    pub fn with_allowed_extensions<I, E>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<String>,
    {
        self.allowed_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the size cap in bytes.
    #[must_use]
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Whether a file with this name passes the extension policy.
    #[must_use]
    pub fn allows_extension(&self, filename: &str) -> bool {
        if self.allowed_extensions.is_empty() {
            return true;
        }
        let ext = extension(filename);
        self.allowed_extensions.iter().any(|allowed| {
            let allowed = allowed.trim();
            let allowed = allowed.strip_prefix('.').unwrap_or(allowed);
            !allowed.is_empty() && ext.get(1..).is_some_and(|e| e.eq_ignore_ascii_case(allowed))
        })
    }

    /// Whether a file of `size` bytes fits the cap.
    #[must_use]
    pub fn allows_size(&self, size: u64) -> bool {
        size <= self.max_file_size
    }

    /// Key prefix for uploads of `model`.
    #[must_use]
    pub fn upload_path(&self, model: &str) -> String {
        [self.path.trim_matches('/'), model, self.field.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Attachment domain model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Unique identifier.
    pub id: i64,
    /// Owner type name.
    pub model_type: String,
    /// Owner id.
    pub model_id: i64,
    /// Field on the owner.
    pub field: String,
    /// Stored filename.
    pub filename: String,
    /// Provider storage key, never a URL.
    pub path: String,
    /// Public URL, recomputed on every load.
    pub url: String,
    /// Size in bytes.
    pub size: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Attachment {
    /// Owner handle for this attachment.
    #[must_use]
    pub fn owner(&self) -> AttachmentOwner {
        AttachmentOwner::new(&self.model_type, self.model_id)
    }
}

/// Input for creating an attachment record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttachment {
    /// Owner type name.
    pub model_type: String,
    /// Owner id.
    pub model_id: i64,
    /// Field on the owner.
    pub field: String,
    /// Stored filename.
    pub filename: String,
    /// Provider storage key.
    pub path: String,
    /// Public URL at write time.
    pub url: String,
    /// Size in bytes.
    pub size: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn image_config() -> AttachmentConfig {
        AttachmentConfig::new("avatar", "media/files")
            .with_allowed_extensions([".jpg", ".PNG", "webp"])
            .with_max_file_size(5 * 1024 * 1024)
    }

    #[rstest]
    #[case("a.jpg", true)]
    #[case("a.JPG", true)]
    #[case("a.png", true)]
    #[case("a.webp", true)]
    #[case("a.pdf", false)]
    #[case("jpg", false)]
    #[case("a.", false)]
    fn test_allows_extension(#[case] filename: &str, #[case] expected: bool) {
        assert_eq!(image_config().allows_extension(filename), expected);
    }

    #[test]
    fn test_empty_allow_list_allows_every_extension() {
        let config = AttachmentConfig::new("file", "media");
        assert!(config.allows_extension("a.exe"));
        assert!(config.allows_size(DEFAULT_MAX_FILE_SIZE));
        assert!(!config.allows_size(DEFAULT_MAX_FILE_SIZE + 1));
    }

    #[test]
    fn test_zero_cap_rejects_non_empty_files() {
        let config = AttachmentConfig::new("file", "media").with_max_file_size(0);
        assert!(config.allows_size(0));
        assert!(!config.allows_size(1));
    }

    #[test]
    fn test_allows_size() {
        let config = image_config();
        assert!(config.allows_size(5 * 1024 * 1024));
        assert!(!config.allows_size(5 * 1024 * 1024 + 1));
    }

    #[rstest]
    #[case("media/files", "profile", "media/files/profile/avatar")]
    #[case("/media/files/", "profile", "media/files/profile/avatar")]
    #[case("", "profile", "profile/avatar")]
    fn test_upload_path(#[case] path: &str, #[case] model: &str, #[case] expected: &str) {
        let config = AttachmentConfig::new("avatar", path);
        assert_eq!(config.upload_path(model), expected);
    }

    #[test]
    fn test_owner_handle() {
        let owner = AttachmentOwner::new("profile", 7);
        assert_eq!(owner.model_name(), "profile");
        assert_eq!(owner.model_id(), 7);
    }
}
