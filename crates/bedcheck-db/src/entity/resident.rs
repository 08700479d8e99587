//! resident entity for database storage.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::NotSet, Set};

use bedcheck_types::{Resident, ResidentId};

/// resident database model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "residents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub external_id: String,
    pub name: String,
    pub room: String,
    pub bed: Option<String>,
    pub class_name: Option<String>,
    pub nationality: Option<String>,
    pub gender: Option<String>,
    pub tracked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::device_binding::Entity")]
    DeviceBindings,
}

impl Related<super::device_binding::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeviceBindings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Resident {
    fn from(model: Model) -> Self {
        Resident {
            id: ResidentId(model.id as u64),
            external_id: model.external_id,
            name: model.name,
            room: model.room,
            bed: model.bed,
            class_name: model.class_name,
            nationality: model.nationality,
            gender: model.gender,
            tracked: model.tracked,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<&Resident> for ActiveModel {
    fn from(resident: &Resident) -> Self {
        ActiveModel {
            id: if resident.id.0 == 0 {
                NotSet
            } else {
                Set(resident.id.0 as i64)
            },
            external_id: Set(resident.external_id.clone()),
            name: Set(resident.name.clone()),
            room: Set(resident.room.clone()),
            bed: Set(resident.bed.clone()),
            class_name: Set(resident.class_name.clone()),
            nationality: Set(resident.nationality.clone()),
            gender: Set(resident.gender.clone()),
            tracked: Set(resident.tracked),
            created_at: Set(resident.created_at),
            updated_at: Set(resident.updated_at),
        }
    }
}
