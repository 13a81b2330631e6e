//! Attachment repository for database operations.
//!
//! Deletes are soft: `deleted_at` is set and every lookup ignores such rows.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::entities::attachments;
use stowage_core::attachment::{
    Attachment, AttachmentError, AttachmentRepository as AttachmentRepoTrait, NewAttachment,
};

/// Attachment repository implementation.
#[derive(Debug, Clone)]
pub struct AttachmentRepository {
    db: DatabaseConnection,
}

impl AttachmentRepository {
    /// Create a new attachment repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl AttachmentRepoTrait for AttachmentRepository {
    async fn create(&self, input: NewAttachment) -> Result<Attachment, AttachmentError> {
        let now = Utc::now();
        let active_model = attachments::ActiveModel {
            id: NotSet,
            model_type: Set(input.model_type),
            model_id: Set(input.model_id),
            field: Set(input.field),
            filename: Set(input.filename),
            path: Set(input.path),
            url: Set(input.url),
            size: Set(input.size),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            deleted_at: Set(None),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))?;

        Ok(to_domain(model))
    }

    async fn find_by_owner(
        &self,
        model_type: &str,
        model_id: i64,
        field: &str,
    ) -> Result<Option<Attachment>, AttachmentError> {
        let model = attachments::Entity::find()
            .filter(attachments::Column::ModelType.eq(model_type))
            .filter(attachments::Column::ModelId.eq(model_id))
            .filter(attachments::Column::Field.eq(field))
            .filter(attachments::Column::DeletedAt.is_null())
            .order_by_desc(attachments::Column::Id)
            .one(&self.db)
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))?;

        Ok(model.map(to_domain))
    }

    async fn exists_by_path(&self, path: &str) -> Result<bool, AttachmentError> {
        let count: u64 = attachments::Entity::find()
            .filter(attachments::Column::Path.eq(path))
            .filter(attachments::Column::DeletedAt.is_null())
            .count(&self.db)
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))?;

        Ok(count > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool, AttachmentError> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let result = attachments::Entity::update_many()
            .col_expr(attachments::Column::DeletedAt, Expr::value(now))
            .col_expr(attachments::Column::UpdatedAt, Expr::value(now))
            .filter(attachments::Column::Id.eq(id))
            .filter(attachments::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}

/// Convert database model to domain model.
fn to_domain(model: attachments::Model) -> Attachment {
    Attachment {
        id: model.id,
        model_type: model.model_type,
        model_id: model.model_id,
        field: model.field,
        filename: model.filename,
        path: model.path,
        url: model.url,
        size: model.size,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
        deleted_at: model.deleted_at.map(|at| at.with_timezone(&Utc)),
    }
}
