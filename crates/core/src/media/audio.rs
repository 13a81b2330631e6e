//! Audio to Opus conversion through the external encoder.

use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

use bytes::Bytes;

use super::classify::{extension, replace_extension};
use super::encoder::Encoder;
use super::error::ConversionError;
use super::pipeline::Converted;

/// Default Opus bitrate in kbps.
pub const DEFAULT_AUDIO_BITRATE: i64 = 96;
/// Wall-clock limit for one audio conversion.
pub const AUDIO_TIMEOUT: Duration = Duration::from_secs(3 * 60);

const AUDIO_EXTENSIONS: &[&str] = &[
    ".mp3", ".wav", ".flac", ".aac", ".m4a", ".ogg", ".wma", ".opus",
];

/// Transcodes audio files to Opus, dropping any video stream.
#[derive(Debug, Clone)]
pub struct AudioConverter {
    bitrate_kbps: i64,
    timeout: Duration,
    encoder: Encoder,
}

impl Default for AudioConverter {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIO_BITRATE)
    }
}

impl AudioConverter {
    /// Create a converter. A bitrate of zero or less falls back to 96 kbps.
    #[must_use]
    pub fn new(bitrate_kbps: i64) -> Self {
        Self {
            bitrate_kbps: clamp_bitrate(bitrate_kbps),
            timeout: AUDIO_TIMEOUT,
            encoder: Encoder::default(),
        }
    }

    /// Same converter with a different bitrate.
    #[must_use]
    pub fn with_bitrate(mut self, bitrate_kbps: i64) -> Self {
        self.bitrate_kbps = clamp_bitrate(bitrate_kbps);
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

    /// Effective bitrate in kbps.
    #[must_use]
    pub fn bitrate_kbps(&self) -> i64 {
        self.bitrate_kbps
    }

    /// Whether this converter accepts the file.
    #[must_use]
    pub fn is_audio_file(filename: &str) -> bool {
        AUDIO_EXTENSIONS.contains(&extension(filename).as_str())
    }

    /// Convert to Opus. Returns `None` for non-audio and `.opus` input.
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
        if !Self::is_audio_file(filename) || ext == ".opus" {
            return Ok(None);
        }

        let bitrate = self.bitrate_kbps;
        tracing::debug!(filename, bitrate, "converting audio to opus");
        let output = self
            .encoder
            .transcode(data, &ext, ".opus", self.timeout, |input, output| {
                encoder_args(input, output, bitrate)
            })
            .await?;

        Ok(Some(Converted {
            data: Bytes::from(output),
            filename: replace_extension(filename, "opus"),
        }))
    }
}

fn encoder_args(input: &Path, output: &Path, bitrate_kbps: i64) -> Vec<OsString> {
    vec![
        "-i".into(),
        input.into(),
        "-c:a".into(),
        "libopus".into(),
        "-b:a".into(),
        format!("{bitrate_kbps}k").into(),
        "-vn".into(),
        "-y".into(),
        output.into(),
    ]
}

fn clamp_bitrate(bitrate_kbps: i64) -> i64 {
    if bitrate_kbps > 0 {
        bitrate_kbps
    } else {
        DEFAULT_AUDIO_BITRATE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitrate_clamps() {
        assert_eq!(AudioConverter::new(0).bitrate_kbps(), 96);
        assert_eq!(AudioConverter::new(-64).bitrate_kbps(), 96);
        assert_eq!(AudioConverter::new(128).bitrate_kbps(), 128);
        assert_eq!(AudioConverter::default().with_bitrate(0).bitrate_kbps(), 96);
    }

    #[test]
    fn test_is_audio_file() {
        assert!(AudioConverter::is_audio_file("song.MP3"));
        assert!(AudioConverter::is_audio_file("voice.opus"));
        assert!(!AudioConverter::is_audio_file("clip.mp4"));
    }

    #[test]
    fn test_encoder_args_strip_video() {
        let args = encoder_args(Path::new("in.wav"), Path::new("out.opus"), 64);
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            ["-i", "in.wav", "-c:a", "libopus", "-b:a", "64k", "-vn", "-y", "out.opus"]
        );
    }

    #[tokio::test]
    async fn test_opus_input_is_noop() {
        let converter =
            AudioConverter::default().with_encoder(Encoder::new("stowage-no-such-encoder"));
        let result = converter
            .convert(&Bytes::from_static(b"opus"), "voice.opus")
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_missing_encoder_is_explicit_error() {
        let converter =
            AudioConverter::default().with_encoder(Encoder::new("stowage-no-such-encoder"));
        let err = converter
            .convert(&Bytes::from_static(b"wav"), "voice.wav")
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::EncoderNotFound { .. }));
    }
}
