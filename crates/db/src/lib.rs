//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for `attachments` and the read-only `settings` view
//! - Repository implementations of the core persistence traits
//! - The attachments schema migration

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{AttachmentRepository, SettingsRepository};

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use stowage_shared::DatabaseConfig;

/// Pool options derived from the database section of the app config.
#[must_use]
pub fn connect_options(config: &DatabaseConfig) -> ConnectOptions {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections.min(config.max_connections));
    options
}

/// Establishes a connection pool sized by `config`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    tracing::debug!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "connecting to database"
    );
    Database::connect(connect_options(config)).await
}

/// Connects and applies every pending migration.
///
/// # Errors
///
/// Returns an error if the connection or a migration fails.
pub async fn connect_and_migrate(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let db = connect(config).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("attachment schema is up to date");
    Ok(db)
}
