//! Repository implementations of the core persistence traits.

mod attachment;
mod settings;

pub use attachment::AttachmentRepository;
pub use settings::SettingsRepository;
