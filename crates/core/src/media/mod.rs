//! Media classification and transcoding.
//!
//! Images are re-encoded in process; video and audio go through an external
//! encoder binary (`ffmpeg` by default) that only has to exist once a file
//! of that kind is actually converted.

mod audio;
mod classify;
mod encoder;
mod error;
mod pipeline;
mod raster;
mod video;

pub use audio::{AUDIO_TIMEOUT, AudioConverter, DEFAULT_AUDIO_BITRATE};
pub use classify::{
    MediaType, detect_media_type, extension, replace_extension, should_convert, target_format,
};
pub use encoder::{DEFAULT_ENCODER, Encoder};
pub use error::ConversionError;
pub use pipeline::{ConversionOptions, Converted, MediaPipeline};
pub use raster::{DEFAULT_WEBP_QUALITY, ImageConverter};
pub use video::{DEFAULT_VIDEO_CRF, VIDEO_TIMEOUT, VideoConverter};
