//! the resident-facing surface: check-in page and submission.
//!
//! identity rides on an opaque device token: an explicit `?token=`
//! query parameter beats the long-lived cookie, and a token that
//! resolves is written back into the cookie so the next visit works
//! without the link.

use axum::{
    Json,
    extract::{Form, Query, State},
    http::{HeaderMap, header},
    response::{Html, IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::error::{ApiError, ResultExt};
use super::templates;
use crate::checkin::{CheckinOutcome, CheckinRequest};
use crate::day;
use crate::AppState;
use bedcheck_db::Database;
use bedcheck_types::DeviceToken;

/// name of the long-lived device token cookie.
const TOKEN_COOKIE: &str = "bedcheck_token";

/// cookie lifetime: one year, like the binding itself.
const TOKEN_COOKIE_MAX_AGE: u64 = 60 * 60 * 24 * 365;

/// optional `?token=` query parameter.
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    /// explicit device token; beats the cookie when present.
    pub token: Option<String>,
}

/// check-in form body as submitted by the page.
///
/// coordinates arrive as strings so a browser handing over junk turns
/// into an `INVALID_LOCATION` rejection rather than a 422.
#[derive(Debug, Deserialize)]
pub struct CheckinForm {
    /// submitted latitude.
    pub lat: Option<String>,
    /// submitted longitude.
    pub lng: Option<String>,
    /// opaque reference to an already-stored evidence file.
    pub evidence_ref: Option<String>,
}

/// pick the device token for a request: query parameter, then cookie.
fn extract_token(query_token: Option<&str>, headers: &HeaderMap) -> Option<DeviceToken> {
    if let Some(token) = query_token.filter(|t| !t.is_empty()) {
        return Some(DeviceToken::new(token));
    }
    cookie_value(headers, TOKEN_COOKIE)
        .filter(|t| !t.is_empty())
        .map(DeviceToken::new)
}

/// read one cookie from the Cookie header.
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == name).then(|| v.to_string())
    })
}

/// the Set-Cookie value that persists a resolved token.
fn token_cookie(token: &DeviceToken) -> String {
    format!(
        "{TOKEN_COOKIE}={}; Max-Age={TOKEN_COOKIE_MAX_AGE}; Path=/; HttpOnly; SameSite=Lax",
        token
    )
}

/// the client address as reported by the front proxy, if any.
fn remote_addr(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// GET / - the resident check-in page.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let token = extract_token(query.token.as_deref(), &headers);

    let resident = match &token {
        Some(token) => state.db.resolve_token(token).await.map_internal()?,
        None => None,
    };

    // today's derived status, for the greeting
    let today_record = match (&token, &resident) {
        (Some(token), Some(_)) => {
            let now = Utc::now();
            let (start, end) = day::day_window(day::local_date(now, state.offset), state.offset);
            state
                .db
                .latest_checkin_between(token, start, end)
                .await
                .map_internal()?
        }
        _ => None,
    };

    let html = templates::checkin_page(resident.as_ref(), today_record.as_ref(), state.offset);

    let mut response = Html(html).into_response();
    if let (Some(token), Some(_)) = (&token, &resident) {
        // refresh the binding cookie so the device stays recognized
        response.headers_mut().insert(
            header::SET_COOKIE,
            token_cookie(token).parse().map_internal()?,
        );
    }
    Ok(response)
}

/// POST /checkin - process one check-in attempt.
///
/// business rejections are 200 with a machine-readable code; only
/// storage faults become 500.
pub async fn checkin(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
    Form(form): Form<CheckinForm>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let token = extract_token(query.token.as_deref(), &headers)
        .unwrap_or_else(|| DeviceToken::new(""));

    let request = CheckinRequest {
        token,
        latitude: form.lat.as_deref().and_then(|v| v.trim().parse().ok()),
        longitude: form.lng.as_deref().and_then(|v| v.trim().parse().ok()),
        evidence_ref: form.evidence_ref,
        remote_addr: remote_addr(&headers),
    };

    let outcome = state
        .engine
        .process(&state.db, Utc::now(), request)
        .await
        .map_internal()?;

    let body = match outcome {
        CheckinOutcome::Accepted {
            record,
            distance_meters,
            ..
        } => json!({
            "code": "ACCEPTED",
            "message": "點名成功！今晚已完成登記，晚安。",
            "record_id": record.id,
            "checked_in_at": record.recorded_at.with_timezone(&state.offset).to_rfc3339(),
            "distance_meters": distance_meters,
        }),
        CheckinOutcome::Rejected(rejection) => {
            let mut body = json!({
                "code": rejection.code(),
                "message": rejection.message(),
            });
            if let crate::checkin::Rejection::OutOfRange { distance_meters } = rejection {
                body["distance_meters"] = json!(distance_meters);
            }
            body
        }
    };

    Ok(Json(body))
}

/// GET /manifest.json - static pwa manifest.
pub async fn manifest() -> Response {
    (
        [(header::CONTENT_TYPE, "application/manifest+json")],
        templates::MANIFEST_JSON,
    )
        .into_response()
}
