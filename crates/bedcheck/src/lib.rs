//! bedcheck - geofenced dormitory check-in server.
//!
//! this crate wires the domain types and storage layer into the running
//! service:
//! - [`checkin`]: the check-in workflow engine and manual override
//! - [`report`]: the daily attendance aggregator and csv export
//! - [`roster`]: roster sync, binding issuance, personal-link export
//! - [`profiles`]: ios/android install profile generation
//! - [`handlers`]: axum http handlers
//! - [`cli`]: command-line interface

#![warn(missing_docs)]

pub mod checkin;
pub mod cli;
mod day;
/// http request handlers for the resident and staff surfaces.
pub mod handlers;
pub mod profiles;
pub mod report;
pub mod roster;

pub use day::{day_window, local_date};

use axum::{
    Router,
    routing::{get, post},
};
use chrono::FixedOffset;

use bedcheck_db::BedcheckDb;
use bedcheck_types::Config;
use checkin::CheckinEngine;

/// shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// database connection for persistent storage.
    pub db: BedcheckDb,

    /// server configuration.
    pub config: Config,

    /// the check-in engine built from the configured fence.
    pub engine: CheckinEngine,

    /// the utc offset defining the local day boundary.
    pub offset: FixedOffset,
}

/// create the axum application with all routes.
///
/// fails only when the configured geofence or utc offset is invalid;
/// both are checked here so a bad config dies at startup, not at the
/// first check-in of the night.
pub fn create_app(db: BedcheckDb, config: Config) -> Result<Router, bedcheck_types::Error> {
    let engine = CheckinEngine::new(&config)?;
    let offset = config.display.offset()?;

    let state = AppState {
        db,
        config,
        engine,
        offset,
    };

    Ok(Router::new()
        .route("/", get(handlers::index))
        .route("/checkin", post(handlers::checkin))
        .route("/manifest.json", get(handlers::manifest))
        .route("/healthz", get(handlers::health))
        .route("/admin/report", get(handlers::attendance))
        .route("/admin/report.csv", get(handlers::attendance_csv))
        .route("/admin/override", post(handlers::override_checkin))
        .with_state(state))
}
