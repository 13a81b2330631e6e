//! Process-wide upload policy registry.

use std::collections::HashMap;

use dashmap::DashMap;

use super::error::AttachmentError;
use super::types::AttachmentConfig;

/// Upload policies keyed by model name, then field.
///
/// Registration normally happens once at startup, but the map is concurrent
/// so late registration cannot corrupt lookups.
#[derive(Debug, Default)]
pub struct AttachmentRegistry {
    configs: DashMap<String, HashMap<String, AttachmentConfig>>,
}

impl AttachmentRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the config for `(model, config.field)`.
    pub fn register(&self, model: &str, config: AttachmentConfig) {
        tracing::debug!(model, field = %config.field, "registering attachment config");
        self.configs
            .entry(model.to_string())
            .or_default()
            .insert(config.field.clone(), config);
    }

    /// Look up the config for `(model, field)`.
    ///
    /// # Errors
    ///
    /// Distinguishes an unknown model from an unknown field.
    pub fn get(&self, model: &str, field: &str) -> Result<AttachmentConfig, AttachmentError> {
        let fields = self
            .configs
            .get(model)
            .ok_or_else(|| AttachmentError::ModelNotRegistered {
                model: model.to_string(),
            })?;
        fields
            .get(field)
            .cloned()
            .ok_or_else(|| AttachmentError::FieldNotRegistered {
                model: model.to_string(),
                field: field.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let registry = AttachmentRegistry::new();
        registry.register("profile", AttachmentConfig::new("avatar", "media"));
        let config = registry.get("profile", "avatar").unwrap();
        assert_eq!(config.path, "media");
    }

    #[test]
    fn test_register_is_upsert() {
        let registry = AttachmentRegistry::new();
        registry.register("profile", AttachmentConfig::new("avatar", "old"));
        registry.register("profile", AttachmentConfig::new("avatar", "new"));
        registry.register("profile", AttachmentConfig::new("cover", "media"));
        assert_eq!(registry.get("profile", "avatar").unwrap().path, "new");
        assert_eq!(registry.get("profile", "cover").unwrap().path, "media");
    }

    #[test]
    fn test_missing_model_and_field() {
        let registry = AttachmentRegistry::new();
        registry.register("profile", AttachmentConfig::new("avatar", "media"));

        let err = registry.get("post", "image").unwrap_err();
        assert!(matches!(err, AttachmentError::ModelNotRegistered { .. }));

        let err = registry.get("profile", "cover").unwrap_err();
        assert!(matches!(err, AttachmentError::FieldNotRegistered { .. }));
    }
}
