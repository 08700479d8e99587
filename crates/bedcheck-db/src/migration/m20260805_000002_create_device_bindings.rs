//! create device_bindings table migration.

use sea_orm_migration::prelude::*;

use super::m20260805_000001_create_residents::Residents;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DeviceBindings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DeviceBindings::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DeviceBindings::ResidentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DeviceBindings::Token).string().not_null())
                    .col(
                        ColumnDef::new(DeviceBindings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_device_bindings_resident")
                            .from(DeviceBindings::Table, DeviceBindings::ResidentId)
                            .to(Residents::Table, Residents::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // one device per resident
        manager
            .create_index(
                Index::create()
                    .name("idx_device_bindings_resident_id")
                    .table(DeviceBindings::Table)
                    .col(DeviceBindings::ResidentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // one resident per device, and the hot path looks up by token
        manager
            .create_index(
                Index::create()
                    .name("idx_device_bindings_token")
                    .table(DeviceBindings::Table)
                    .col(DeviceBindings::Token)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DeviceBindings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum DeviceBindings {
    #[sea_orm(iden = "device_bindings")]
    Table,
    Id,
    ResidentId,
    Token,
    CreatedAt,
}
