//! core types for bedcheck - a geofenced dormitory check-in server.
//!
//! this crate provides the fundamental data structures used throughout bedcheck:
//! - [`geo`]: haversine distance math and the dormitory fence
//! - [`resident`]: roster entries for dormitory residents
//! - [`device_binding`]: opaque device tokens and their bindings to residents
//! - [`checkin`]: append-only check-in records
//! - [`config`]: application configuration

mod checkin;
mod config;
mod device_binding;
mod error;
mod geo;
mod resident;

pub use checkin::{CheckinId, CheckinRecord, CheckinStatus, CheckinStatusError};
pub use config::{
    Config, DatabaseConfig, DisplayConfig, EvidenceConfig, GeofenceConfig, SqliteConfig,
};
pub use device_binding::{DeviceBinding, DeviceToken};
pub use error::Error;
pub use geo::{Coordinates, EARTH_RADIUS_METERS, Geofence, distance_meters, is_within_fence};
pub use resident::{Resident, ResidentId};
