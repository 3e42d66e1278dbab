use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000001_create_profiles::Profile;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Ride::Table)
                    .if_not_exists()
                    .col(uuid(Ride::Id).primary_key())
                    .col(uuid(Ride::DriverId).not_null())
                    .col(string_len(Ride::PickupLocation, 255).not_null())
                    .col(string_len(Ride::Destination, 255).not_null())
                    .col(timestamp_with_time_zone(Ride::DateTime).not_null())
                    .col(
                        integer(Ride::AvailableSeats)
                            .not_null()
                            .check(Expr::col(Ride::AvailableSeats).gte(0)),
                    )
                    .col(integer(Ride::PricePerSeat).not_null())
                    .col(string_len(Ride::CarModel, 100).not_null())
                    .col(string_len(Ride::NumberPlate, 20).not_null())
                    .col(
                        timestamp_with_time_zone(Ride::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ride_driver")
                            .from(Ride::Table, Ride::DriverId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Ride::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Ride {
    Table,
    Id,
    DriverId,
    PickupLocation,
    Destination,
    DateTime,
    AvailableSeats,
    PricePerSeat,
    CarModel,
    NumberPlate,
    CreatedAt,
}
