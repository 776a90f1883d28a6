//! Create upload table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Upload::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Upload::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Upload::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Upload::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Upload::ContentType).string_len(128).not_null())
                    .col(ColumnDef::new(Upload::Size).big_integer().not_null())
                    .col(ColumnDef::new(Upload::StorageKey).string_len(512).not_null())
                    .col(ColumnDef::new(Upload::Url).string_len(512).not_null())
                    .col(ColumnDef::new(Upload::Md5).string_len(32).not_null())
                    .col(ColumnDef::new(Upload::Width).integer())
                    .col(ColumnDef::new(Upload::Height).integer())
                    .col(ColumnDef::new(Upload::Blurhash).string_len(128))
                    .col(
                        ColumnDef::new(Upload::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_upload_user")
                            .from(Upload::Table, Upload::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: user_id (listing a user's uploads)
        manager
            .create_index(
                Index::create()
                    .name("idx_upload_user_id")
                    .table(Upload::Table)
                    .col(Upload::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Upload::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Upload {
    Table,
    Id,
    UserId,
    Name,
    ContentType,
    Size,
    StorageKey,
    Url,
    Md5,
    Width,
    Height,
    Blurhash,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
