//! database migrations for bedcheck.

pub use sea_orm_migration::prelude::*;

mod m20260805_000001_create_residents;
mod m20260805_000002_create_device_bindings;
mod m20260805_000003_create_checkin_records;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260805_000001_create_residents::Migration),
            Box::new(m20260805_000002_create_device_bindings::Migration),
            Box::new(m20260805_000003_create_checkin_records::Migration),
        ]
    }
}
