use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Roles are stored as plain strings so the schema runs on both
        // Postgres and SQLite.
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(uuid(User::Id).primary_key())
                    .col(string_len(User::Name, 100).not_null())
                    .col(string_len(User::Email, 255).not_null().unique_key())
                    .col(string_len(User::PasswordHash, 255).not_null())
                    .col(string_len(User::Role, 16).not_null())
                    .col(boolean(User::IsVerified).not_null().default(false))
                    .col(boolean(User::IsApproved).not_null().default(false))
                    .col(string_len_null(User::PhoneNumber, 32))
                    .col(string_len_null(User::ResetToken, 128))
                    .col(timestamp_with_time_zone_null(User::ResetTokenExpiresAt))
                    .col(timestamp_with_time_zone(User::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(User::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_reset_token")
                    .table(User::Table)
                    .col(User::ResetToken)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum User {
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    Role,
    IsVerified,
    IsApproved,
    PhoneNumber,
    ResetToken,
    ResetTokenExpiresAt,
    CreatedAt,
    UpdatedAt,
}
