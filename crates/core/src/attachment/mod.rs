//! Attachments: binding uploaded blobs to owner records.
//!
//! An attachment row is keyed by `(model_type, model_id, field)`; owners are
//! never linked by foreign key. [`ActiveStorage`] drives the whole flow:
//! policy lookup, validation, optional conversion, upload, persistence.

mod error;
mod registry;
mod repository;
mod service;
mod sync;
mod types;

pub use error::{AttachmentError, ErrorKind};
pub use registry::AttachmentRegistry;
pub use repository::{
    AttachmentRepository, NoSettings, SETTING_AUDIO_BITRATE, SETTING_CONVERT_AUDIO,
    SETTING_CONVERT_IMAGES, SETTING_CONVERT_VIDEOS, SETTING_VIDEO_CRF, SETTING_WEBP_QUALITY,
    SettingsLookup,
};
pub use service::ActiveStorage;
pub use sync::{SyncObject, SyncOwnerFactory, SyncResult};
pub use types::{
    Attachable, Attachment, AttachmentConfig, AttachmentOwner, DEFAULT_MAX_FILE_SIZE, NewAttachment,
};
