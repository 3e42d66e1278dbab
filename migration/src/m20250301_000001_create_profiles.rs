use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create profile role enum
        manager
            .create_type(
                Type::create()
                    .as_enum(ProfileRole::Enum)
                    .values([ProfileRole::Driver, ProfileRole::Passenger])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Profile::Table)
                    .if_not_exists()
                    .col(uuid(Profile::Id).primary_key())
                    .col(string_len(Profile::FullName, 100).not_null())
                    .col(string_len(Profile::Email, 255).not_null().unique_key())
                    .col(string_len(Profile::PhoneNumber, 20).not_null())
                    .col(string_len(Profile::PasswordHash, 255).not_null())
                    .col(
                        ColumnDef::new(Profile::Role)
                            .custom(ProfileRole::Enum)
                            .not_null(),
                    )
                    .col(
                        timestamp_with_time_zone(Profile::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Profile::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(ProfileRole::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Profile {
    Table,
    Id,
    FullName,
    Email,
    PhoneNumber,
    PasswordHash,
    Role,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum ProfileRole {
    #[sea_orm(iden = "profile_role")]
    Enum,
    #[sea_orm(iden = "driver")]
    Driver,
    #[sea_orm(iden = "passenger")]
    Passenger,
}
