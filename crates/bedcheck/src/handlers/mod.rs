//! http handlers for the bedcheck server.

mod admin;
mod checkin;
mod error;
mod health;
mod staff_auth;
mod templates;

pub use admin::{attendance, attendance_csv, override_checkin};
pub use checkin::{checkin, index, manifest};
pub use error::{ApiError, ResultExt};
pub use health::health;
pub use staff_auth::StaffContext;
