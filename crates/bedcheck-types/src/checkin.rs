//! append-only check-in records.
//!
//! every accepted check-in becomes one immutable row. nothing updates or
//! deletes these rows; "today's status" is always derived by reading the
//! newest record in a day window.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device_binding::DeviceToken;
use crate::geo::Coordinates;

/// unique identifier for a check-in record.
///
/// ids are assigned by the database in insertion order, so a larger id
/// always means a later record. ties between records with identical
/// timestamps are broken by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CheckinId(pub u64);

impl From<u64> for CheckinId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for CheckinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// how a check-in record came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckinStatus {
    /// the resident checked in from inside the fence.
    Success,

    /// dorm staff recorded the check-in by hand.
    Manual,
}

impl CheckinStatus {
    /// the string stored in the database for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckinStatus::Success => "SUCCESS",
            CheckinStatus::Manual => "MANUAL",
        }
    }
}

impl fmt::Display for CheckinStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CheckinStatus {
    type Err = CheckinStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(CheckinStatus::Success),
            "MANUAL" => Ok(CheckinStatus::Manual),
            other => Err(CheckinStatusError::Unknown(other.to_string())),
        }
    }
}

/// error type for unrecognized status strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckinStatusError {
    /// the string matches no known status.
    #[error("unknown check-in status: {0}")]
    Unknown(String),
}

/// one accepted check-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinRecord {
    /// unique identifier, assigned by the database in insertion order.
    pub id: CheckinId,

    /// the device token that checked in.
    ///
    /// records keep the token rather than a resident id so that history
    /// survives re-binding; resolution to a resident happens at read time.
    pub token: DeviceToken,

    /// how the record came to exist.
    pub status: CheckinStatus,

    /// when the check-in was accepted.
    pub recorded_at: DateTime<Utc>,

    /// where the device reported itself. absent for manual overrides.
    pub location: Option<Coordinates>,

    /// opaque reference to captured evidence (e.g. a photo filename).
    pub evidence_ref: Option<String>,

    /// remote address the request arrived from.
    pub remote_addr: Option<String>,
}

impl CheckinRecord {
    /// create a new record with no optional fields set.
    pub fn new(token: DeviceToken, status: CheckinStatus, recorded_at: DateTime<Utc>) -> Self {
        Self {
            id: CheckinId(0),
            token,
            status,
            recorded_at,
            location: None,
            evidence_ref: None,
            remote_addr: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        assert_eq!(
            "SUCCESS".parse::<CheckinStatus>().unwrap(),
            CheckinStatus::Success
        );
        assert_eq!(
            "MANUAL".parse::<CheckinStatus>().unwrap(),
            CheckinStatus::Manual
        );
        assert_eq!(CheckinStatus::Success.as_str(), "SUCCESS");
        assert_eq!(CheckinStatus::Manual.as_str(), "MANUAL");
    }

    #[test]
    fn test_status_rejects_unknown() {
        assert!("success".parse::<CheckinStatus>().is_err());
        assert!("FAILED".parse::<CheckinStatus>().is_err());
    }

    #[test]
    fn test_ids_order_by_value() {
        assert!(CheckinId(2) > CheckinId(1));
    }
}
