//! database layer for bedcheck.
//!
//! this crate provides persistent storage for:
//! - Residents (the dormitory roster)
//! - Device bindings (opaque token -> resident)
//! - Check-in records (the append-only ledger)

#![warn(missing_docs)]

mod entity;
mod error;
mod migration;

pub use error::Error;

use std::future::Future;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, Database as SeaOrmDatabase, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use sea_orm_migration::MigratorTrait;

use bedcheck_types::{CheckinRecord, Config, DeviceBinding, DeviceToken, Resident, ResidentId};

/// result type for database operations.
pub type Result<T> = std::result::Result<T, Error>;

/// database trait for bedcheck storage operations.
///
/// this trait abstracts over different database backends (sqlite, postgresql).
/// check-in records are append-only: the trait deliberately exposes no way to
/// update or delete them.
pub trait Database: Send + Sync {
    // ─── Health Check ─────────────────────────────────────────────────────────

    /// ping the database to verify connectivity.
    ///
    /// returns `ok(())` if the database is reachable, `err` otherwise.
    /// used for health checks with a recommended timeout of 1 second.
    fn ping(&self) -> impl Future<Output = Result<()>> + Send;

    // ─── Resident Operations ─────────────────────────────────────────────────

    /// create a new resident. Returns the created resident with its assigned ID.
    fn create_resident(&self, resident: &Resident)
    -> impl Future<Output = Result<Resident>> + Send;

    /// get a resident by id. Returns `None` if not found.
    fn get_resident(&self, id: ResidentId) -> impl Future<Output = Result<Option<Resident>>> + Send;

    /// get a resident by school-issued student number. returns `none` if not found.
    fn get_resident_by_external_id(
        &self,
        external_id: &str,
    ) -> impl Future<Output = Result<Option<Resident>>> + Send;

    /// list all residents, ordered by room then student number.
    ///
    /// this is the order reports print in.
    fn list_residents(&self) -> impl Future<Output = Result<Vec<Resident>>> + Send;

    /// update an existing resident. also bumps `updated_at`.
    fn update_resident(&self, resident: &Resident)
    -> impl Future<Output = Result<Resident>> + Send;

    // ─── Device Binding Operations ───────────────────────────────────────────

    /// bind a device token to a resident.
    ///
    /// any existing binding for the same resident or the same token is
    /// replaced, so both uniqueness rules (one device per resident, one
    /// resident per device) hold afterwards.
    fn bind_device(
        &self,
        binding: &DeviceBinding,
    ) -> impl Future<Output = Result<DeviceBinding>> + Send;

    /// get the binding for a resident, if any.
    fn get_binding_for_resident(
        &self,
        resident_id: ResidentId,
    ) -> impl Future<Output = Result<Option<DeviceBinding>>> + Send;

    /// get a binding by its token, if any.
    fn get_binding_by_token(
        &self,
        token: &DeviceToken,
    ) -> impl Future<Output = Result<Option<DeviceBinding>>> + Send;

    /// list all bindings.
    fn list_bindings(&self) -> impl Future<Output = Result<Vec<DeviceBinding>>> + Send;

    /// resolve a token to the resident it is bound to.
    ///
    /// returns `none` for unknown tokens and for bindings whose resident
    /// row has gone missing; the caller cannot tell the two apart, which
    /// is fine because both mean "this device identifies nobody".
    fn resolve_token(
        &self,
        token: &DeviceToken,
    ) -> impl Future<Output = Result<Option<Resident>>> + Send;

    // ─── Check-in Ledger Operations ──────────────────────────────────────────

    /// append a check-in record. returns the record with its assigned id.
    ///
    /// ids are assigned in insertion order, so later records always carry
    /// larger ids.
    fn record_checkin(
        &self,
        record: &CheckinRecord,
    ) -> impl Future<Output = Result<CheckinRecord>> + Send;

    /// get the newest record for a token with `start <= recorded_at < end`.
    ///
    /// "newest" means highest id, which also settles ties between records
    /// sharing a timestamp.
    fn latest_checkin_between(
        &self,
        token: &DeviceToken,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<CheckinRecord>>> + Send;

    /// list every record with `start <= recorded_at < end`, oldest first.
    fn list_checkins_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<CheckinRecord>>> + Send;

    /// total number of records in the ledger.
    fn count_checkins(&self) -> impl Future<Output = Result<u64>> + Send;
}

/// the main database implementation using sea-orm.
#[derive(Clone)]
pub struct BedcheckDb {
    conn: DatabaseConnection,
}

impl BedcheckDb {
    /// create a new database connection from config.
    pub async fn new(config: &Config) -> Result<Self> {
        let url = Self::build_connection_url(&config.database)?;
        let conn: DatabaseConnection = SeaOrmDatabase::connect(&url)
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        let db = Self { conn };

        // enable WAL mode for sqlite if configured
        if config.database.db_type == "sqlite" && config.database.sqlite.write_ahead_log {
            db.enable_wal_mode().await?;
        }

        db.migrate().await?;
        Ok(db)
    }

    /// enable write-ahead logging mode for sqlite.
    ///
    /// WAL mode allows concurrent reads during writes and generally
    /// improves performance. must be called before any writes.
    async fn enable_wal_mode(&self) -> Result<()> {
        use sea_orm::ConnectionTrait;
        self.conn
            .execute_unprepared("PRAGMA journal_mode=WAL")
            .await
            .map_err(|e| Error::Connection(format!("failed to enable WAL mode: {}", e)))?;
        tracing::info!("sqlite WAL mode enabled");
        Ok(())
    }

    /// get the current sqlite journal mode.
    #[cfg(test)]
    async fn get_journal_mode(&self) -> Result<String> {
        use sea_orm::{ConnectionTrait, FromQueryResult};

        #[derive(FromQueryResult)]
        struct JournalMode {
            journal_mode: String,
        }

        let result: Option<JournalMode> = self
            .conn
            .query_one(sea_orm::Statement::from_string(
                sea_orm::DatabaseBackend::Sqlite,
                "PRAGMA journal_mode".to_string(),
            ))
            .await
            .map_err(|e| Error::Connection(e.to_string()))?
            .map(|row| JournalMode::from_query_result(&row, "").unwrap());

        Ok(result.map(|r| r.journal_mode).unwrap_or_default())
    }

    /// build a sea-orm compatible connection url from config.
    fn build_connection_url(config: &bedcheck_types::DatabaseConfig) -> Result<String> {
        match config.db_type.as_str() {
            "sqlite" => {
                // for sqlite, build the connection url with create mode
                let path = if config.connection_string.starts_with("sqlite:") {
                    config.connection_string.clone()
                } else {
                    format!("sqlite:{}", config.connection_string)
                };
                // add ?mode=rwc to create file if it doesn't exist
                if path.contains('?') {
                    Ok(path)
                } else {
                    Ok(format!("{}?mode=rwc", path))
                }
            }
            "postgres" | "postgresql" => {
                // postgresql urls should already be properly formatted
                Ok(config.connection_string.clone())
            }
            other => Err(Error::InvalidData(format!(
                "unsupported database type: {}",
                other
            ))),
        }
    }

    /// create an in-memory sqlite database for testing.
    pub async fn new_in_memory() -> Result<Self> {
        let conn: DatabaseConnection = SeaOrmDatabase::connect("sqlite::memory:")
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        let db = Self { conn };
        db.migrate().await?;
        Ok(db)
    }

    /// run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        migration::Migrator::up(&self.conn, None)
            .await
            .map_err(|e| Error::Migration(e.to_string()))?;
        Ok(())
    }

    /// close the database connection.
    ///
    /// NOTE: sea-orm connections are reference-counted and cleaned up on drop.
    /// this method exists for explicit cleanup and logging purposes.
    pub async fn close(&self) -> Result<()> {
        tracing::debug!("database connection marked for close");
        Ok(())
    }
}

impl Database for BedcheckDb {
    // health check

    async fn ping(&self) -> Result<()> {
        use sea_orm::ConnectionTrait;
        self.conn
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        Ok(())
    }

    // resident operations

    async fn create_resident(&self, resident: &Resident) -> Result<Resident> {
        let model: entity::resident::ActiveModel = resident.into();
        let result = model.insert(&self.conn).await?;
        Ok(result.into())
    }

    async fn get_resident(&self, id: ResidentId) -> Result<Option<Resident>> {
        let result = entity::resident::Entity::find_by_id(id.0 as i64)
            .one(&self.conn)
            .await?;
        Ok(result.map(Into::into))
    }

    async fn get_resident_by_external_id(&self, external_id: &str) -> Result<Option<Resident>> {
        let result = entity::resident::Entity::find()
            .filter(entity::resident::Column::ExternalId.eq(external_id))
            .one(&self.conn)
            .await?;
        Ok(result.map(Into::into))
    }

    async fn list_residents(&self) -> Result<Vec<Resident>> {
        let results = entity::resident::Entity::find()
            .order_by_asc(entity::resident::Column::Room)
            .order_by_asc(entity::resident::Column::ExternalId)
            .all(&self.conn)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn update_resident(&self, resident: &Resident) -> Result<Resident> {
        let mut model: entity::resident::ActiveModel = resident.into();
        model.updated_at = Set(Utc::now());
        let result = model.update(&self.conn).await?;
        Ok(result.into())
    }

    // device binding operations

    async fn bind_device(&self, binding: &DeviceBinding) -> Result<DeviceBinding> {
        // clear any binding that would collide with either uniqueness rule
        entity::device_binding::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(
                        entity::device_binding::Column::ResidentId
                            .eq(binding.resident_id.0 as i64),
                    )
                    .add(entity::device_binding::Column::Token.eq(binding.token.as_str())),
            )
            .exec(&self.conn)
            .await?;

        let model: entity::device_binding::ActiveModel = binding.into();
        let result = model.insert(&self.conn).await?;
        Ok(result.into())
    }

    async fn get_binding_for_resident(
        &self,
        resident_id: ResidentId,
    ) -> Result<Option<DeviceBinding>> {
        let result = entity::device_binding::Entity::find()
            .filter(entity::device_binding::Column::ResidentId.eq(resident_id.0 as i64))
            .one(&self.conn)
            .await?;
        Ok(result.map(Into::into))
    }

    async fn get_binding_by_token(&self, token: &DeviceToken) -> Result<Option<DeviceBinding>> {
        let result = entity::device_binding::Entity::find()
            .filter(entity::device_binding::Column::Token.eq(token.as_str()))
            .one(&self.conn)
            .await?;
        Ok(result.map(Into::into))
    }

    async fn list_bindings(&self) -> Result<Vec<DeviceBinding>> {
        let results = entity::device_binding::Entity::find()
            .all(&self.conn)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn resolve_token(&self, token: &DeviceToken) -> Result<Option<Resident>> {
        let binding = entity::device_binding::Entity::find()
            .filter(entity::device_binding::Column::Token.eq(token.as_str()))
            .one(&self.conn)
            .await?;

        let Some(binding) = binding else {
            return Ok(None);
        };

        let resident = entity::resident::Entity::find_by_id(binding.resident_id)
            .one(&self.conn)
            .await?;
        Ok(resident.map(Into::into))
    }

    // check-in ledger operations

    async fn record_checkin(&self, record: &CheckinRecord) -> Result<CheckinRecord> {
        // the empty token never identifies a device; a row keyed on it
        // would be unreachable from every read path
        if record.token.is_empty() {
            return Err(Error::InvalidData(
                "check-in token must be non-empty".to_string(),
            ));
        }

        let model: entity::checkin_record::ActiveModel = record.into();
        let result = model.insert(&self.conn).await?;
        Ok(result.into())
    }

    async fn latest_checkin_between(
        &self,
        token: &DeviceToken,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<CheckinRecord>> {
        let result = entity::checkin_record::Entity::find()
            .filter(entity::checkin_record::Column::Token.eq(token.as_str()))
            .filter(entity::checkin_record::Column::RecordedAt.gte(start))
            .filter(entity::checkin_record::Column::RecordedAt.lt(end))
            .order_by_desc(entity::checkin_record::Column::Id)
            .one(&self.conn)
            .await?;
        Ok(result.map(Into::into))
    }

    async fn list_checkins_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CheckinRecord>> {
        let results = entity::checkin_record::Entity::find()
            .filter(entity::checkin_record::Column::RecordedAt.gte(start))
            .filter(entity::checkin_record::Column::RecordedAt.lt(end))
            .order_by_asc(entity::checkin_record::Column::Id)
            .all(&self.conn)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn count_checkins(&self) -> Result<u64> {
        let count = entity::checkin_record::Entity::find()
            .count(&self.conn)
            .await?;
        Ok(count)
    }
}
