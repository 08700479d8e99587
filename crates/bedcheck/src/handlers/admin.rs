//! staff-only endpoints: daily report, csv export, manual override.
//!
//! all three sit behind the [`StaffContext`] extractor; there is no
//! per-staff identity, just the shared key.

use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use super::error::{ApiError, ResultExt};
use super::staff_auth::StaffContext;
use crate::checkin::OverrideOutcome;
use crate::day;
use crate::report::{self, AttendanceReport};
use crate::AppState;

/// optional `?day=YYYY-MM-DD` query parameter.
#[derive(Debug, Deserialize)]
pub struct DayQuery {
    /// the local calendar day to report on; today when absent.
    pub day: Option<String>,
}

/// manual override request body.
#[derive(Debug, Deserialize)]
pub struct OverrideRequest {
    /// student number of the resident to mark present.
    pub external_id: String,
}

fn resolve_day(state: &AppState, query: &DayQuery) -> Result<NaiveDate, ApiError> {
    match &query.day {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| ApiError::bad_request(format!("invalid day: {raw}"))),
        None => Ok(day::local_date(Utc::now(), state.offset)),
    }
}

async fn build_report(state: &AppState, query: &DayQuery) -> Result<AttendanceReport, ApiError> {
    let day = resolve_day(state, query)?;
    report::attendance_report(&state.db, day, state.offset)
        .await
        .map_internal()
}

/// GET /admin/report - the daily attendance report as json.
pub async fn attendance(
    _staff: StaffContext,
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> Result<Json<AttendanceReport>, ApiError> {
    Ok(Json(build_report(&state, &query).await?))
}

/// GET /admin/report.csv - the daily attendance report as a csv download.
pub async fn attendance_csv(
    _staff: StaffContext,
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> Result<Response, ApiError> {
    let report = build_report(&state, &query).await?;
    let csv = report::to_csv(&report);
    let disposition = format!("attachment; filename=\"bedcheck-{}.csv\"", report.day);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

/// POST /admin/override - record a check-in by hand.
pub async fn override_checkin(
    _staff: StaffContext,
    State(state): State<AppState>,
    Json(request): Json<OverrideRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let outcome = state
        .engine
        .manual_override(&state.db, Utc::now(), &request.external_id)
        .await
        .map_internal()?;

    match outcome {
        OverrideOutcome::Recorded { resident, record } => Ok(Json(json!({
            "code": "RECORDED",
            "external_id": resident.external_id,
            "name": resident.name,
            "record_id": record.id,
            "recorded_at": record.recorded_at.with_timezone(&state.offset).to_rfc3339(),
        }))),
        OverrideOutcome::ResidentNotFound { external_id } => Err(ApiError::not_found(format!(
            "no resident with external id {external_id}"
        ))),
    }
}
