use sea_orm_migration::{prelude::*, schema::*};

use super::m20240501_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Booking::Table)
                    .if_not_exists()
                    .col(uuid(Booking::Id).primary_key())
                    .col(uuid(Booking::CustomerId).not_null())
                    .col(uuid_null(Booking::MowerId))
                    .col(string_len(Booking::Date, 10).not_null())
                    .col(string_len(Booking::Time, 5).not_null())
                    .col(string_len(Booking::Address, 255).not_null())
                    .col(text(Booking::Description).not_null())
                    .col(string_len(Booking::Status, 16).not_null())
                    .col(double(Booking::Price).not_null().default(0.0))
                    .col(string_len(Booking::BillingStatus, 16).not_null())
                    .col(timestamp_with_time_zone_null(Booking::AcceptedAt))
                    .col(timestamp_with_time_zone_null(Booking::CompletedAt))
                    .col(timestamp_with_time_zone(Booking::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Booking::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_customer")
                            .from(Booking::Table, Booking::CustomerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_mower")
                            .from(Booking::Table, Booking::MowerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Mower discovery lists by status, dashboards list by participant.
        for (name, column) in [
            ("idx_booking_status", Booking::Status),
            ("idx_booking_customer", Booking::CustomerId),
            ("idx_booking_mower", Booking::MowerId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Booking::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Booking::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Booking {
    Table,
    Id,
    CustomerId,
    MowerId,
    Date,
    Time,
    Address,
    Description,
    Status,
    Price,
    BillingStatus,
    AcceptedAt,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}
