//! error types for bedcheck-types

use thiserror::Error;

/// errors that can occur validating configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// the fence center is not a usable coordinate pair.
    #[error("geofence center ({0}, {1}) is not a valid coordinate")]
    InvalidFenceCenter(f64, f64),

    /// the fence radius is not a usable distance.
    #[error("geofence radius must be finite and non-negative, got {0}")]
    InvalidFenceRadius(f64),

    /// the day-boundary offset does not describe a real utc offset.
    #[error("utc offset of {0} minutes is out of range")]
    InvalidUtcOffset(i32),
}
