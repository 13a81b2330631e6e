//! Extension-based media classification and conversion policy.

use serde::{Deserialize, Serialize};

const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp", ".tiff", ".tif", ".svg",
];
const VIDEO_EXTENSIONS: &[&str] = &[
    ".mp4", ".mov", ".avi", ".mkv", ".webm", ".flv", ".wmv", ".m4v", ".mpeg", ".mpg",
];
const AUDIO_EXTENSIONS: &[&str] = &[
    ".mp3", ".wav", ".flac", ".aac", ".m4a", ".ogg", ".wma", ".opus",
];
const DOCUMENT_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".txt", ".csv",
];

/// Broad media category of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    /// Raster or vector image.
    Image,
    /// Video container.
    Video,
    /// Audio file.
    Audio,
    /// Office document or plain text.
    Document,
    /// Anything else.
    Other,
}

impl MediaType {
    /// Convert to string value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
            Self::Other => "other",
        }
    }
}

/// Lowercased extension including the leading dot, or an empty string.
///
/// A leading dot (`.env`) is not an extension.
#[must_use]
pub fn extension(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    match base.rfind('.') {
        Some(idx) if idx > 0 => base[idx..].to_ascii_lowercase(),
        _ => String::new(),
    }
}

/// Filename with its extension replaced by `new_ext` (given without dot).
#[must_use]
pub fn replace_extension(filename: &str, new_ext: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let stem = match base.rfind('.') {
        Some(idx) if idx > 0 => &base[..idx],
        _ => base,
    };
    format!("{stem}.{new_ext}")
}

/// Classify a file by extension. Unknown extensions are [`MediaType::Other`].
#[must_use]
pub fn detect_media_type(filename: &str) -> MediaType {
    let ext = extension(filename);
    let ext = ext.as_str();
    if IMAGE_EXTENSIONS.contains(&ext) {
        MediaType::Image
    } else if VIDEO_EXTENSIONS.contains(&ext) {
        MediaType::Video
    } else if AUDIO_EXTENSIONS.contains(&ext) {
        MediaType::Audio
    } else if DOCUMENT_EXTENSIONS.contains(&ext) {
        MediaType::Document
    } else {
        MediaType::Other
    }
}

/// Target format (without dot) for a media type, if it is converted at all.
#[must_use]
pub fn target_format(media_type: MediaType) -> Option<&'static str> {
    match media_type {
        MediaType::Image => Some("webp"),
        MediaType::Video => Some("webm"),
        MediaType::Audio => Some("opus"),
        MediaType::Document | MediaType::Other => None,
    }
}

/// Whether a file has a conversion target and is not already in it.
#[must_use]
pub fn should_convert(filename: &str) -> bool {
    target_format(detect_media_type(filename))
        .is_some_and(|target| extension(filename) != format!(".{target}"))
}
