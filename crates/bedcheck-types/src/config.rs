//! configuration types for bedcheck

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::geo::{Coordinates, Geofence};

/// main configuration for bedcheck.
///
/// every field has a default, so a config file only needs to spell out
/// what differs from a stock deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// public url of this server (used in generated links and profiles).
    pub server_url: String,

    /// address to bind the http server to.
    pub listen_addr: String,

    /// shared key for staff endpoints (reports, manual overrides).
    ///
    /// when unset, staff endpoints refuse everything.
    pub staff_key: Option<String>,

    /// database configuration.
    pub database: DatabaseConfig,

    /// geofence configuration.
    pub geofence: GeofenceConfig,

    /// photo evidence configuration.
    pub evidence: EvidenceConfig,

    /// report and day-window display configuration.
    pub display: DisplayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".to_string(),
            listen_addr: "0.0.0.0:8080".to_string(),
            staff_key: None,
            database: DatabaseConfig::default(),
            geofence: GeofenceConfig::default(),
            evidence: EvidenceConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

/// database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// database type: "sqlite" or "postgres".
    pub db_type: String,

    /// database connection string or file path.
    pub connection_string: String,

    /// sqlite-specific options, ignored for postgres.
    pub sqlite: SqliteConfig,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: "sqlite".to_string(),
            connection_string: "/var/lib/bedcheck/db.sqlite".to_string(),
            sqlite: SqliteConfig::default(),
        }
    }
}

/// sqlite-specific database options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// enable write-ahead logging.
    pub write_ahead_log: bool,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            write_ahead_log: true,
        }
    }
}

/// geofence configuration.
///
/// defaults describe the production dormitory in taoyuan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeofenceConfig {
    /// latitude of the fence center in decimal degrees.
    pub center_latitude: f64,

    /// longitude of the fence center in decimal degrees.
    pub center_longitude: f64,

    /// fence radius in meters.
    pub radius_meters: f64,
}

impl GeofenceConfig {
    /// build the runtime fence from this configuration, rejecting
    /// nonsense values before they can silently admit or evict everyone.
    pub fn fence(&self) -> Result<Geofence, Error> {
        let center = Coordinates::new(self.center_latitude, self.center_longitude);
        if !center.is_valid() {
            return Err(Error::InvalidFenceCenter(
                self.center_latitude,
                self.center_longitude,
            ));
        }
        if !self.radius_meters.is_finite() || self.radius_meters < 0.0 {
            return Err(Error::InvalidFenceRadius(self.radius_meters));
        }
        Ok(Geofence::new(center, self.radius_meters))
    }
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            center_latitude: 24.998040186562055,
            center_longitude: 121.34191342114971,
            radius_meters: 1000.0,
        }
    }
}

/// photo evidence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceConfig {
    /// whether a check-in must carry an evidence reference.
    pub required: bool,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self { required: false }
    }
}

/// report and day-window display configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// offset from utc, in minutes, that defines the local day boundary.
    ///
    /// a fixed offset rather than a tz database name: dormitory curfew
    /// does not observe daylight saving, and the deployment site (utc+8)
    /// has none. 480 = utc+8.
    pub utc_offset_minutes: i32,
}

impl DisplayConfig {
    /// the configured offset as a chrono [`FixedOffset`].
    pub fn offset(&self) -> Result<FixedOffset, Error> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(Error::InvalidUtcOffset(self.utc_offset_minutes))
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 480,
        }
    }
}
