//! Core attachment and blob storage engine for Stowage.
//!
//! This crate has ZERO web or database dependencies. Persistence and the
//! settings store are reached through the traits in [`attachment`].
//!
//! # Modules
//!
//! - `storage` - Blob storage providers (local, S3, R2)
//! - `media` - Media classification and WebP/WebM/Opus conversion
//! - `attachment` - The `ActiveStorage` orchestrator and attachment records

pub mod attachment;
pub mod media;
pub mod storage;
