//! Create complaint table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Complaint::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Complaint::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Complaint::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Complaint::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Complaint::Description).text().not_null())
                    .col(ColumnDef::new(Complaint::Category).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Complaint::Status)
                            .string_len(16)
                            .not_null()
                            .default("Open"),
                    )
                    .col(ColumnDef::new(Complaint::Branch).string_len(64).not_null())
                    .col(ColumnDef::new(Complaint::ImageUrl).string_len(512))
                    .col(
                        ColumnDef::new(Complaint::Score)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Complaint::Rating).integer())
                    .col(ColumnDef::new(Complaint::ReviewComment).text())
                    .col(ColumnDef::new(Complaint::AdminRemark).text())
                    .col(
                        ColumnDef::new(Complaint::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Complaint::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_complaint_user")
                            .from(Complaint::Table, Complaint::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (branch, created_at) - branch feed is the hot query
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_branch_created_at")
                    .table(Complaint::Table)
                    .col(Complaint::Branch)
                    .col(Complaint::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: user_id (history page)
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_user_id")
                    .table(Complaint::Table)
                    .col(Complaint::UserId)
                    .to_owned(),
            )
            .await?;

        // Index: status (feed filters, stats)
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_status")
                    .table(Complaint::Table)
                    .col(Complaint::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Complaint::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Complaint {
    Table,
    Id,
    UserId,
    Title,
    Description,
    Category,
    Status,
    Branch,
    ImageUrl,
    Score,
    Rating,
    ReviewComment,
    AdminRemark,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
