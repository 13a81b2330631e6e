//! Raster image to WebP conversion.

use bytes::Bytes;
use image::ImageFormat;

use super::classify::{extension, replace_extension};
use super::error::ConversionError;
use super::pipeline::Converted;

/// Default WebP quality.
pub const DEFAULT_WEBP_QUALITY: i64 = 85;

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".bmp", ".tiff", ".tif", ".webp"];

/// Re-encodes raster images as lossy WebP.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageConverter {
    quality: f32,
}

impl Default for ImageConverter {
    fn default() -> Self {
        Self::new(DEFAULT_WEBP_QUALITY)
    }
}

impl ImageConverter {
    /// Create a converter. Quality outside `1..=100` falls back to 85.
    #[must_use]
    pub fn new(quality: i64) -> Self {
        Self {
            quality: clamp_quality(quality),
        }
    }

    /// Same converter with a different quality.
    #[must_use]
    pub fn with_quality(self, quality: i64) -> Self {
        Self::new(quality)
    }

    /// Effective quality.
    #[must_use]
    pub fn quality(&self) -> f32 {
        self.quality
    }

    /// Whether this converter accepts the file.
    #[must_use]
    pub fn is_image_file(filename: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&extension(filename).as_str())
    }

    /// Convert to WebP. Returns `None` for non-images and for `.webp` input.
    ///
    /// Decoding and encoding run on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::Decode`] for unreadable input and
    /// [`ConversionError::Encode`] if libwebp rejects the frame.
    pub async fn convert(
        &self,
        data: &Bytes,
        filename: &str,
    ) -> Result<Option<Converted>, ConversionError> {
        let ext = extension(filename);
        if !Self::is_image_file(filename) || ext == ".webp" {
            return Ok(None);
        }

        let input = data.clone();
        let name = filename.to_string();
        let quality = self.quality;
        let encoded = tokio::task::spawn_blocking(move || encode_webp(&input, &ext, quality, &name))
            .await
            .map_err(|e| ConversionError::TaskFailed(e.to_string()))??;

        Ok(Some(Converted {
            data: Bytes::from(encoded),
            filename: replace_extension(filename, "webp"),
        }))
    }
}

// 1..=100 is exact in f32
#[allow(clippy::cast_precision_loss)]
fn clamp_quality(quality: i64) -> f32 {
    if (1..=100).contains(&quality) {
        quality as f32
    } else {
        DEFAULT_WEBP_QUALITY as f32
    }
}

fn encode_webp(
    data: &[u8],
    ext: &str,
    quality: f32,
    filename: &str,
) -> Result<Vec<u8>, ConversionError> {
    let decoded = match ImageFormat::from_extension(ext.trim_start_matches('.')) {
        Some(format @ (ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP)) => {
            image::load_from_memory_with_format(data, format)
        }
        _ => image::load_from_memory(data),
    }
    .map_err(|e| ConversionError::decode(filename, e))?;

    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    let encoded = webp::Encoder::from_rgba(rgba.as_raw(), width, height)
        .encode_simple(false, quality)
        .map_err(|e| ConversionError::encode(filename, format!("{e:?}")))?;

    Ok(encoded.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use rstest::rstest;
    use std::io::Cursor;

    fn png_bytes() -> Bytes {
        let img = RgbImage::from_fn(16, 16, |x, y| {
            Rgb([(x * 16) as u8, (y * 16) as u8, 128])
        });
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        Bytes::from(buf.into_inner())
    }

    #[rstest]
    #[case(0, 85.0)]
    #[case(-5, 85.0)]
    #[case(101, 85.0)]
    #[case(1, 1.0)]
    #[case(100, 100.0)]
    #[case(60, 60.0)]
    fn test_quality_clamps(#[case] input: i64, #[case] expected: f32) {
        assert!((ImageConverter::new(input).quality() - expected).abs() < f32::EPSILON);
    }

    #[rstest]
    #[case("a.jpg", true)]
    #[case("a.JPEG", true)]
    #[case("a.png", true)]
    #[case("a.tif", true)]
    #[case("a.webp", true)]
    #[case("a.gif", false)]
    #[case("a.svg", false)]
    #[case("a.pdf", false)]
    fn test_is_image_file(#[case] filename: &str, #[case] expected: bool) {
        assert_eq!(ImageConverter::is_image_file(filename), expected);
    }

    #[tokio::test]
    async fn test_png_converts_to_webp() {
        let input = png_bytes();
        let converted = ImageConverter::default()
            .convert(&input, "photo.png")
            .await
            .unwrap()
            .expect("png should convert");

        assert_eq!(converted.filename, "photo.webp");
        assert_eq!(&converted.data[0..4], b"RIFF");
        assert_eq!(&converted.data[8..12], b"WEBP");
        assert_ne!(converted.data, input);
    }

    #[tokio::test]
    async fn test_webp_input_is_noop() {
        let result = ImageConverter::default()
            .convert(&Bytes::from_static(b"whatever"), "photo.webp")
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_non_image_is_noop() {
        let result = ImageConverter::default()
            .convert(&Bytes::from_static(b"%PDF-1.4"), "doc.pdf")
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_image_is_decode_error() {
        let err = ImageConverter::default()
            .convert(&Bytes::from_static(b"not a png"), "broken.png")
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_generic_decoder_fallback() {
        // PNG bytes under a .bmp name are still decoded by content sniffing.
        let converted = ImageConverter::default()
            .convert(&png_bytes(), "scan.bmp")
            .await
            .unwrap()
            .expect("sniffed image should convert");
        assert_eq!(converted.filename, "scan.webp");
    }
}
