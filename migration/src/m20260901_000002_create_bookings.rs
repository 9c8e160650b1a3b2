use sea_orm_migration::{prelude::*, schema::*};

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
                    .col(string_len(Booking::Reference, 16).not_null().unique_key())
                    .col(string_len(Booking::CustomerName, 200).not_null())
                    .col(string_len(Booking::CustomerEmail, 254).not_null())
                    .col(string_len(Booking::CustomerPhone, 32).not_null())
                    .col(json_binary(Booking::Pickup).not_null())
                    .col(json_binary(Booking::Dropoff).not_null())
                    .col(json_binary(Booking::Stops).not_null())
                    .col(big_integer(Booking::DistanceYards).not_null())
                    .col(string_len(Booking::VehicleType, 16).not_null())
                    .col(string_len(Booking::TripType, 16).not_null())
                    .col(integer(Booking::Passengers).not_null())
                    .col(integer(Booking::Luggage).not_null())
                    .col(timestamp_with_time_zone(Booking::PickupAt).not_null())
                    .col(timestamp_with_time_zone_null(Booking::ReturnAt))
                    .col(integer_null(Booking::HourlyHours))
                    .col(text_null(Booking::Notes))
                    .col(json_binary(Booking::Payment).not_null())
                    .col(string_len(Booking::Status, 16).not_null())
                    .col(
                        timestamp_with_time_zone(Booking::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_booking_pickup_at")
                    .table(Booking::Table)
                    .col(Booking::PickupAt)
                    .to_owned(),
            )
            .await
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
    Reference,
    CustomerName,
    CustomerEmail,
    CustomerPhone,
    Pickup,
    Dropoff,
    Stops,
    DistanceYards,
    VehicleType,
    TripType,
    Passengers,
    Luggage,
    PickupAt,
    ReturnAt,
    HourlyHours,
    Notes,
    Payment,
    Status,
    CreatedAt,
}
