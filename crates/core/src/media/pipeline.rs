//! Ordered conversion over the three converters.

use bytes::Bytes;
use stowage_shared::MediaSettings;

use super::audio::AudioConverter;
use super::encoder::Encoder;
use super::error::ConversionError;
use super::raster::ImageConverter;
use super::video::VideoConverter;

/// Output of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converted {
    /// Transcoded bytes.
    pub data: Bytes,
    /// Original stem with the target extension.
    pub filename: String,
}

/// Per-call conversion switches and parameter overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Convert images to WebP.
    pub images: bool,
    /// Convert video to WebM.
    pub videos: bool,
    /// Convert audio to Opus.
    pub audio: bool,
    /// WebP quality override.
    pub webp_quality: Option<i64>,
    /// Video CRF override.
    pub video_crf: Option<i64>,
    /// Audio bitrate override (kbps).
    pub audio_bitrate: Option<i64>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            images: true,
            videos: true,
            audio: true,
            webp_quality: None,
            video_crf: None,
            audio_bitrate: None,
        }
    }
}

impl ConversionOptions {
    /// Options with every conversion switched off.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            images: false,
            videos: false,
            audio: false,
            ..Self::default()
        }
    }
}

/// The image, video and audio converters, tried in that order.
#[derive(Debug, Clone, Default)]
pub struct MediaPipeline {
    image: ImageConverter,
    video: VideoConverter,
    audio: AudioConverter,
}

impl MediaPipeline {
    /// Build from explicit converters.
    #[must_use]
    pub fn new(image: ImageConverter, video: VideoConverter, audio: AudioConverter) -> Self {
        Self {
            image,
            video,
            audio,
        }
    }

    /// Build from configured defaults.
    #[must_use]
    pub fn from_settings(settings: &MediaSettings) -> Self {
        let encoder = Encoder::new(&settings.encoder);
        Self {
            image: ImageConverter::new(settings.webp_quality),
            video: VideoConverter::new(settings.video_crf).with_encoder(encoder.clone()),
            audio: AudioConverter::new(settings.audio_bitrate).with_encoder(encoder),
        }
    }

    /// Image converter.
    #[must_use]
    pub fn image(&self) -> &ImageConverter {
        &self.image
    }

    /// Video converter.
    #[must_use]
    pub fn video(&self) -> &VideoConverter {
        &self.video
    }

    /// Audio converter.
    #[must_use]
    pub fn audio(&self) -> &AudioConverter {
        &self.audio
    }

    /// Convert `data` with the first enabled converter that accepts the file
    /// and produces output. `None` means the original bytes should be stored.
    ///
    /// # Errors
    ///
    /// Propagates the error of the converter that was attempted; later
    /// converters are not tried after a failure.
    pub async fn convert(
        &self,
        data: &Bytes,
        filename: &str,
        options: &ConversionOptions,
    ) -> Result<Option<Converted>, ConversionError> {
        if options.images && ImageConverter::is_image_file(filename) {
            let image = match options.webp_quality {
                Some(quality) => self.image.with_quality(quality),
                None => self.image,
            };
            if let Some(converted) = image.convert(data, filename).await? {
                return Ok(Some(converted));
            }
        }

        if options.videos && VideoConverter::is_video_file(filename) {
            let converted = match options.video_crf {
                Some(crf) => self.video.clone().with_crf(crf).convert(data, filename).await?,
                None => self.video.convert(data, filename).await?,
            };
            if converted.is_some() {
                return Ok(converted);
            }
        }

        if options.audio && AudioConverter::is_audio_file(filename) {
            let converted = match options.audio_bitrate {
                Some(bitrate) => {
                    self.audio
                        .clone()
                        .with_bitrate(bitrate)
                        .convert(data, filename)
                        .await?
                }
                None => self.audio.convert(data, filename).await?,
            };
            if converted.is_some() {
                return Ok(converted);
            }
        }

        tracing::debug!(filename, "no conversion applied");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbaImage};
    use std::io::Cursor;

    fn png() -> Bytes {
        let img = RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        Bytes::from(buf.into_inner())
    }

    fn pipeline_without_encoder() -> MediaPipeline {
        let encoder = Encoder::new("stowage-no-such-encoder");
        MediaPipeline::new(
            ImageConverter::default(),
            VideoConverter::default().with_encoder(encoder.clone()),
            AudioConverter::default().with_encoder(encoder),
        )
    }

    #[tokio::test]
    async fn test_image_enabled_converts() {
        let converted = pipeline_without_encoder()
            .convert(&png(), "a.png", &ConversionOptions::default())
            .await
            .unwrap()
            .expect("image should convert");
        assert_eq!(converted.filename, "a.webp");
    }

    #[tokio::test]
    async fn test_image_disabled_keeps_original() {
        let options = ConversionOptions {
            images: false,
            ..ConversionOptions::default()
        };
        let result = pipeline_without_encoder()
            .convert(&png(), "a.png", &options)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_video_without_encoder_fails() {
        let err = pipeline_without_encoder()
            .convert(&Bytes::from_static(b"mp4"), "a.mp4", &ConversionOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("encoder not found"));
    }

    #[tokio::test]
    async fn test_all_disabled_skips_encoder() {
        let result = pipeline_without_encoder()
            .convert(&Bytes::from_static(b"mp4"), "a.mp4", &ConversionOptions::disabled())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_documents_pass_through() {
        let result = pipeline_without_encoder()
            .convert(&Bytes::from_static(b"%PDF"), "a.pdf", &ConversionOptions::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_from_settings_uses_configured_values() {
        let settings = MediaSettings {
            webp_quality: 70,
            video_crf: 99,
            audio_bitrate: 128,
            encoder: "avconv".to_string(),
        };
        let pipeline = MediaPipeline::from_settings(&settings);
        assert!((pipeline.image().quality() - 70.0).abs() < f32::EPSILON);
        assert_eq!(pipeline.video().crf(), 23);
        assert_eq!(pipeline.audio().bitrate_kbps(), 128);
    }
}
