pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_profiles;
mod m20250301_000002_create_rides;
mod m20250301_000003_create_bookings;
mod m20250301_000004_create_notifications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_profiles::Migration),
            Box::new(m20250301_000002_create_rides::Migration),
            Box::new(m20250301_000003_create_bookings::Migration),
            Box::new(m20250301_000004_create_notifications::Migration),
        ]
    }
}
