//! Shared errors and configuration for Stowage.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error type for HTTP collaborators
//! - Configuration management (database, storage backend, media conversion)

pub mod config;
pub mod error;

pub use config::{AppConfig, DatabaseConfig, MediaSettings, StorageSettings};
pub use error::{AppError, AppResult};
