//! Blob storage providers built on Apache OpenDAL.
//!
//! One provider is chosen at construction time and owned by the
//! [`ActiveStorage`](crate::attachment::ActiveStorage) orchestrator:
//! - `local`: filesystem root, URLs served under a base URL
//! - `s3`: path-style S3-compatible object store
//! - `r2`: Cloudflare R2, URLs preferring a CDN prefix
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     StorageProvider (dyn)                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ upload(file, cfg)          │ get_url(path)      (pure)          │
//! │ upload_bytes(data, name)   │ as_listable()      (s3 / r2 only)  │
//! │ delete(path)               │                                    │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   LocalProvider (services-fs) │ S3Provider / R2Provider (s3)    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod local;
mod object_store;
mod provider;
mod r2;
mod s3;

use std::sync::Arc;

pub use config::{ProviderConfig, UploadConfig};
pub use error::StorageError;
pub use local::LocalProvider;
pub use provider::{
    ListableProvider, RemoteObject, StorageProvider, UploadFile, UploadResult, object_key,
    sanitize_filename, unique_filename,
};
pub use r2::R2Provider;
pub use s3::S3Provider;

/// Build the provider described by `config`.
///
/// # Errors
///
/// Returns [`StorageError::Configuration`] when required credentials, bucket
/// or account are missing, or when the backend client cannot be built.
pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn StorageProvider>, StorageError> {
    let provider: Arc<dyn StorageProvider> = match config {
        ProviderConfig::Local { root, base_url } => Arc::new(LocalProvider::new(root, base_url)?),
        ProviderConfig::S3 {
            endpoint,
            bucket,
            access_key_id,
            secret_access_key,
            region,
        } => Arc::new(S3Provider::new(
            endpoint,
            bucket,
            access_key_id,
            secret_access_key,
            region,
        )?),
        ProviderConfig::R2 {
            account_id,
            bucket,
            access_key_id,
            secret_access_key,
            base_url,
            cdn,
        } => Arc::new(R2Provider::new(
            account_id,
            bucket,
            access_key_id,
            secret_access_key,
            base_url,
            cdn,
        )?),
    };

    tracing::info!(provider = provider.name(), "storage provider initialized");
    Ok(provider)
}
