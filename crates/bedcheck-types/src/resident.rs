//! resident type representing a dormitory roster entry.
//!
//! residents come from the school's roster system and are synced into
//! bedcheck; the roster is the source of truth for who must check in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// unique identifier for a resident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResidentId(pub u64);

impl From<u64> for ResidentId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ResidentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// a dormitory resident who is expected to check in nightly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resident {
    /// unique identifier.
    pub id: ResidentId,

    /// school-issued student number. unique across the roster and stable
    /// across re-syncs, so it is the upsert key.
    pub external_id: String,

    /// full name.
    pub name: String,

    /// room number, e.g. "301".
    pub room: String,

    /// bed number within the room.
    pub bed: Option<String>,

    /// class or homeroom name.
    pub class_name: Option<String>,

    /// nationality, for international student reporting.
    pub nationality: Option<String>,

    /// gender as recorded on the roster.
    pub gender: Option<String>,

    /// whether this resident takes part in nightly check-in.
    ///
    /// only tracked residents get a device binding and appear in the
    /// attendance report; the roster may carry others who don't board.
    pub tracked: bool,

    /// when the resident was first synced.
    pub created_at: DateTime<Utc>,

    /// when the resident was last updated by a sync.
    pub updated_at: DateTime<Utc>,
}

impl Resident {
    /// create a new resident with the given roster fields.
    pub fn new(
        id: ResidentId,
        external_id: impl Into<String>,
        name: impl Into<String>,
        room: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            external_id: external_id.into(),
            name: name.into(),
            room: room.into(),
            bed: None,
            class_name: None,
            nationality: None,
            gender: None,
            tracked: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// room and bed joined for display, e.g. "301-2".
    pub fn bunk(&self) -> String {
        match &self.bed {
            Some(bed) if !bed.is_empty() => format!("{}-{}", self.room, bed),
            _ => self.room.clone(),
        }
    }
}
