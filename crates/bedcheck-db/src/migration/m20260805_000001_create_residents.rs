//! create residents table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Residents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Residents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Residents::ExternalId).string().not_null())
                    .col(ColumnDef::new(Residents::Name).string().not_null())
                    .col(ColumnDef::new(Residents::Room).string().not_null())
                    .col(ColumnDef::new(Residents::Bed).string())
                    .col(ColumnDef::new(Residents::ClassName).string())
                    .col(ColumnDef::new(Residents::Nationality).string())
                    .col(ColumnDef::new(Residents::Gender).string())
                    .col(
                        ColumnDef::new(Residents::Tracked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Residents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Residents::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // the external id is the roster upsert key, so it must be unique
        manager
            .create_index(
                Index::create()
                    .name("idx_residents_external_id")
                    .table(Residents::Table)
                    .col(Residents::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // reports sort by room
        manager
            .create_index(
                Index::create()
                    .name("idx_residents_room")
                    .table(Residents::Table)
                    .col(Residents::Room)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Residents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Residents {
    #[sea_orm(iden = "residents")]
    Table,
    Id,
    ExternalId,
    Name,
    Room,
    Bed,
    ClassName,
    Nationality,
    Gender,
    Tracked,
    CreatedAt,
    UpdatedAt,
}
