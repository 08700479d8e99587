//! check-in record entity for database storage.
//!
//! this table is append-only: no update or delete path exists anywhere
//! in the crate. corrections happen by appending new rows.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::NotSet, Set};
use tracing::warn;

use bedcheck_types::{CheckinId, CheckinRecord, CheckinStatus, Coordinates, DeviceToken};

/// check-in record database model.
///
/// `token` is deliberately not a foreign key: a record must outlive the
/// binding that produced it, so history survives re-binding and roster
/// churn.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "checkin_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub token: String,
    pub status: String,
    pub recorded_at: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub evidence_ref: Option<String>,
    pub remote_addr: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for CheckinRecord {
    fn from(model: Model) -> Self {
        let status = match model.status.parse() {
            Ok(s) => s,
            Err(e) => {
                warn!(record_id = model.id, error = %e, "unknown status in check-in row, treating as SUCCESS");
                CheckinStatus::Success
            }
        };

        // a location needs both components; half a coordinate is no coordinate
        let location = match (model.latitude, model.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        };

        CheckinRecord {
            id: CheckinId(model.id as u64),
            token: DeviceToken::new(model.token),
            status,
            recorded_at: model.recorded_at,
            location,
            evidence_ref: model.evidence_ref,
            remote_addr: model.remote_addr,
        }
    }
}

impl From<&CheckinRecord> for ActiveModel {
    fn from(record: &CheckinRecord) -> Self {
        ActiveModel {
            id: if record.id.0 == 0 {
                NotSet
            } else {
                Set(record.id.0 as i64)
            },
            token: Set(record.token.as_str().to_string()),
            status: Set(record.status.as_str().to_string()),
            recorded_at: Set(record.recorded_at),
            latitude: Set(record.location.map(|c| c.latitude)),
            longitude: Set(record.location.map(|c| c.longitude)),
            evidence_ref: Set(record.evidence_ref.clone()),
            remote_addr: Set(record.remote_addr.clone()),
        }
    }
}
