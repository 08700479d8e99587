//! geofence math for the dormitory perimeter.
//!
//! distances use the haversine great-circle formula on a spherical earth.
//! at dormitory scale (a few hundred meters) the error against a proper
//! ellipsoid is far below consumer gps accuracy, so this is plenty.

use serde::{Deserialize, Serialize};

/// mean earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// a wgs84 coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// latitude in decimal degrees, positive north.
    pub latitude: f64,

    /// longitude in decimal degrees, positive east.
    pub longitude: f64,
}

impl Coordinates {
    /// create a coordinate pair.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// whether both components are finite and within wgs84 bounds.
    ///
    /// browsers occasionally hand us NaN or wildly out-of-range values when
    /// the gps fix is bad, so every inbound coordinate goes through this.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// great-circle distance between two points in meters.
pub fn distance_meters(a: Coordinates, b: Coordinates) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let delta_phi = (b.latitude - a.latitude).to_radians();
    let delta_lambda = (b.longitude - a.longitude).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// whether `point` lies within `radius_meters` of `center`, boundary
/// inclusive.
pub fn is_within_fence(point: Coordinates, center: Coordinates, radius_meters: f64) -> bool {
    distance_meters(center, point) <= radius_meters
}

/// a circular fence around a center point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    /// center of the fence.
    pub center: Coordinates,

    /// radius in meters. points exactly on the boundary count as inside.
    pub radius_meters: f64,
}

impl Geofence {
    /// create a fence around `center` with the given radius.
    pub fn new(center: Coordinates, radius_meters: f64) -> Self {
        Self {
            center,
            radius_meters,
        }
    }

    /// distance from `point` to the fence center in meters.
    pub fn distance_to(&self, point: Coordinates) -> f64 {
        distance_meters(self.center, point)
    }

    /// whether `point` is inside the fence (boundary inclusive).
    pub fn contains(&self, point: Coordinates) -> bool {
        is_within_fence(point, self.center, self.radius_meters)
    }
}
