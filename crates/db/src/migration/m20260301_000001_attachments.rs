//! Attachments table.
//!
//! Built with the schema builder so the same migration runs on Postgres and
//! SQLite. There is no foreign key to owner tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Attachments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Attachments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Attachments::ModelType).string().not_null())
                    .col(ColumnDef::new(Attachments::ModelId).big_integer().not_null())
                    .col(ColumnDef::new(Attachments::Field).string().not_null())
                    .col(ColumnDef::new(Attachments::Filename).string().not_null())
                    .col(ColumnDef::new(Attachments::Path).string().not_null())
                    .col(ColumnDef::new(Attachments::Url).text().not_null())
                    .col(ColumnDef::new(Attachments::Size).big_integer().not_null())
                    .col(
                        ColumnDef::new(Attachments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Attachments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Attachments::DeletedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Owner lookups: (model_type, model_id, field)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_attachments_owner")
                    .table(Attachments::Table)
                    .col(Attachments::ModelType)
                    .col(Attachments::ModelId)
                    .col(Attachments::Field)
                    .to_owned(),
            )
            .await?;

        // Sync existence checks
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_attachments_path")
                    .table(Attachments::Table)
                    .col(Attachments::Path)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Attachments::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Attachments {
    Table,
    Id,
    ModelType,
    ModelId,
    Field,
    Filename,
    Path,
    Url,
    Size,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
