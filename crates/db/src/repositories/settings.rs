//! Settings lookups against the host application's settings table.

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::entities::settings;
use stowage_core::attachment::{AttachmentError, SettingsLookup};

/// Reads conversion switches and tuning values from `settings`.
///
/// A missing table surfaces as an error; the orchestrator treats that the
/// same as an absent row.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    db: DatabaseConnection,
}

impl SettingsRepository {
    /// Create a new settings repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find(&self, key: &str) -> Result<Option<settings::Model>, AttachmentError> {
        settings::Entity::find()
            .filter(settings::Column::SettingKey.eq(key))
            .one(&self.db)
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))
    }
}

impl SettingsLookup for SettingsRepository {
    async fn get_bool(&self, key: &str) -> Result<Option<bool>, AttachmentError> {
        Ok(self.find(key).await?.and_then(|s| s.value_bool))
    }

    async fn get_int(&self, key: &str) -> Result<Option<i64>, AttachmentError> {
        Ok(self.find(key).await?.and_then(|s| s.value_int))
    }
}
