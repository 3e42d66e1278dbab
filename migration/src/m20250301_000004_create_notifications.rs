use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20250301_000001_create_profiles::Profile;
use super::m20250301_000002_create_rides::Ride;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create notification type enum
        manager
            .create_type(
                Type::create()
                    .as_enum(NotificationType::Enum)
                    .values([
                        NotificationType::Booking,
                        NotificationType::Confirmation,
                        NotificationType::Cancellation,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notification::Table)
                    .if_not_exists()
                    .col(uuid(Notification::Id).primary_key())
                    .col(uuid(Notification::SenderId).not_null())
                    .col(uuid(Notification::RecipientId).not_null())
                    .col(
                        ColumnDef::new(Notification::Type)
                            .custom(NotificationType::Enum)
                            .not_null(),
                    )
                    .col(text(Notification::Content).not_null())
                    .col(uuid(Notification::RideId).not_null())
                    .col(boolean(Notification::Read).not_null().default(false))
                    .col(
                        timestamp_with_time_zone(Notification::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_sender")
                            .from(Notification::Table, Notification::SenderId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_recipient")
                            .from(Notification::Table, Notification::RecipientId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_ride")
                            .from(Notification::Table, Notification::RideId)
                            .to(Ride::Table, Ride::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notification::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(NotificationType::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Notification {
    Table,
    Id,
    SenderId,
    RecipientId,
    Type,
    Content,
    RideId,
    Read,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum NotificationType {
    #[sea_orm(iden = "notification_type")]
    Enum,
    #[sea_orm(iden = "booking")]
    Booking,
    #[sea_orm(iden = "confirmation")]
    Confirmation,
    #[sea_orm(iden = "cancellation")]
    Cancellation,
}
