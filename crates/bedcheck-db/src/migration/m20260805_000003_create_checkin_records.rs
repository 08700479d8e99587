//! create checkin_records table migration.
//!
//! no foreign key on token: the ledger must keep rows for tokens whose
//! binding has since been replaced or whose resident left the roster.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CheckinRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CheckinRecords::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CheckinRecords::Token).string().not_null())
                    .col(ColumnDef::new(CheckinRecords::Status).string().not_null())
                    .col(
                        ColumnDef::new(CheckinRecords::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CheckinRecords::Latitude).double())
                    .col(ColumnDef::new(CheckinRecords::Longitude).double())
                    .col(ColumnDef::new(CheckinRecords::EvidenceRef).string())
                    .col(ColumnDef::new(CheckinRecords::RemoteAddr).string())
                    .to_owned(),
            )
            .await?;

        // "has this device checked in today" scans token + window
        manager
            .create_index(
                Index::create()
                    .name("idx_checkin_records_token_recorded_at")
                    .table(CheckinRecords::Table)
                    .col(CheckinRecords::Token)
                    .col(CheckinRecords::RecordedAt)
                    .to_owned(),
            )
            .await?;

        // daily reports scan the whole window
        manager
            .create_index(
                Index::create()
                    .name("idx_checkin_records_recorded_at")
                    .table(CheckinRecords::Table)
                    .col(CheckinRecords::RecordedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CheckinRecords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum CheckinRecords {
    #[sea_orm(iden = "checkin_records")]
    Table,
    Id,
    Token,
    Status,
    RecordedAt,
    Latitude,
    Longitude,
    EvidenceRef,
    RemoteAddr,
}
