//! device binding entity for database storage.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::NotSet, Set};

use bedcheck_types::{DeviceBinding, DeviceToken, ResidentId};

/// device binding database model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "device_bindings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub resident_id: i64,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::resident::Entity",
        from = "Column::ResidentId",
        to = "super::resident::Column::Id"
    )]
    Resident,
}

impl Related<super::resident::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Resident.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for DeviceBinding {
    fn from(model: Model) -> Self {
        DeviceBinding {
            id: model.id as u64,
            resident_id: ResidentId(model.resident_id as u64),
            token: DeviceToken::new(model.token),
            created_at: model.created_at,
        }
    }
}

impl From<&DeviceBinding> for ActiveModel {
    fn from(binding: &DeviceBinding) -> Self {
        ActiveModel {
            id: if binding.id == 0 {
                NotSet
            } else {
                Set(binding.id as i64)
            },
            resident_id: Set(binding.resident_id.0 as i64),
            token: Set(binding.token.as_str().to_string()),
            created_at: Set(binding.created_at),
        }
    }
}
