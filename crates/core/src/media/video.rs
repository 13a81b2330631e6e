//! Video to WebM (VP9 + Opus) conversion through the external encoder.

use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

use bytes::Bytes;

use super::classify::{extension, replace_extension};
use super::encoder::Encoder;
use super::error::ConversionError;
use super::pipeline::Converted;

/// Default constant-quality factor.
pub const DEFAULT_VIDEO_CRF: i64 = 23;
/// Wall-clock limit for one video conversion.
pub const VIDEO_TIMEOUT: Duration = Duration::from_secs(10 * 60);

const VIDEO_EXTENSIONS: &[&str] = &[
    ".mp4", ".mov", ".avi", ".mkv", ".flv", ".wmv", ".webm", ".m4v", ".mpeg", ".mpg",
];

/// Transcodes video containers to WebM.
#[derive(Debug, Clone)]
pub struct VideoConverter {
    crf: i64,
    timeout: Duration,
    encoder: Encoder,
}

impl Default for VideoConverter {
    fn default() -> Self {
        Self::new(DEFAULT_VIDEO_CRF)
    }
}

impl VideoConverter {
    /// Create a converter. CRF outside `0..=51` falls back to 23.
    #[must_use]
    pub fn new(crf: i64) -> Self {
        Self {
            crf: clamp_crf(crf),
            timeout: VIDEO_TIMEOUT,
            encoder: Encoder::default(),
        }
    }

    /// Same converter with a different CRF.
    #[must_use]
    pub fn with_crf(mut self, crf: i64) -> Self {
        self.crf = clamp_crf(crf);
        self
    }

    /// Use a different encoder binary.
    #[must_use]
    pub fn with_encoder(mut self, encoder: Encoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Override the wall-clock limit.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Effective CRF.
    #[must_use]
    pub fn crf(&self) -> i64 {
        self.crf
    }

    /// Whether this converter accepts the file.
    #[must_use]
    pub fn is_video_file(filename: &str) -> bool {
        VIDEO_EXTENSIONS.contains(&extension(filename).as_str())
    }

    /// Convert to WebM. Returns `None` for non-video and `.webm` input.
    ///
    /// # Errors
    ///
    /// Fails when the encoder is not on `PATH`, exits non-zero, or runs past
    /// the timeout.
    pub async fn convert(
        &self,
        data: &Bytes,
        filename: &str,
    ) -> Result<Option<Converted>, ConversionError> {
        let ext = extension(filename);
        if !Self::is_video_file(filename) || ext == ".webm" {
            return Ok(None);
        }

        let crf = self.crf;
        tracing::debug!(filename, crf, "converting video to webm");
        let output = self
            .encoder
            .transcode(data, &ext, ".webm", self.timeout, |input, output| {
                encoder_args(input, output, crf)
            })
            .await?;

        Ok(Some(Converted {
            data: Bytes::from(output),
            filename: replace_extension(filename, "webm"),
        }))
    }
}

fn encoder_args(input: &Path, output: &Path, crf: i64) -> Vec<OsString> {
    vec![
        "-i".into(),
        input.into(),
        "-c:v".into(),
        "libvpx-vp9".into(),
        "-crf".into(),
        crf.to_string().into(),
        "-b:v".into(),
        "0".into(),
        "-c:a".into(),
        "libopus".into(),
        "-y".into(),
        output.into(),
    ]
}

fn clamp_crf(crf: i64) -> i64 {
    if (0..=51).contains(&crf) {
        crf
    } else {
        DEFAULT_VIDEO_CRF
    }
}
