//! staff authentication for the admin endpoints.
//!
//! a single shared key presented as `Authorization: Bearer <key>` and
//! compared in constant time. with no key configured the gate fails
//! closed: the admin surface answers 401 until the operator sets one.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
};
use subtle::ConstantTimeEq;

use crate::AppState;

/// proof that the request carried the staff key.
#[derive(Debug, Clone, Copy)]
pub struct StaffContext;

/// error type for staff authentication failures
#[derive(Debug, PartialEq, Eq)]
pub enum StaffAuthError {
    /// missing Authorization header
    MissingHeader,
    /// invalid Authorization header format
    InvalidHeader,
    /// key mismatch, or no key configured
    InvalidCredentials,
}

impl StaffAuthError {
    fn message(&self) -> &'static str {
        match self {
            Self::MissingHeader => "missing Authorization header",
            Self::InvalidHeader => "invalid Authorization header format",
            Self::InvalidCredentials => "invalid credentials",
        }
    }
}

impl axum::response::IntoResponse for StaffAuthError {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::UNAUTHORIZED, self.message()).into_response()
    }
}

/// parse a Bearer token from the Authorization header
fn parse_bearer_token(header_value: &str) -> Option<&str> {
    header_value.strip_prefix("Bearer ").map(str::trim)
}

/// constant-time comparison of the presented key against the configured one.
fn verify_key(presented: &str, configured: &str) -> bool {
    let presented = presented.as_bytes();
    let configured = configured.as_bytes();
    presented.len() == configured.len() && bool::from(presented.ct_eq(configured))
}

impl FromRequestParts<AppState> for StaffContext {
    type Rejection = StaffAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(StaffAuthError::MissingHeader)?
            .to_str()
            .map_err(|_| StaffAuthError::InvalidHeader)?;

        let presented = parse_bearer_token(auth_header).ok_or(StaffAuthError::InvalidHeader)?;

        // no configured key means no staff access at all
        let configured = state
            .config
            .staff_key
            .as_deref()
            .ok_or(StaffAuthError::InvalidCredentials)?;

        if !verify_key(presented, configured) {
            return Err(StaffAuthError::InvalidCredentials);
        }

        Ok(StaffContext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bearer_token_valid() {
        assert_eq!(parse_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(parse_bearer_token("Bearer  abc123 "), Some("abc123"));
    }

    #[test]
    fn test_parse_bearer_token_invalid() {
        assert_eq!(parse_bearer_token("Basic abc123"), None);
        assert_eq!(parse_bearer_token("bearer abc123"), None); // case sensitive
        assert_eq!(parse_bearer_token("Bearerabc123"), None); // no space
        assert_eq!(parse_bearer_token(""), None);
    }

    #[test]
    fn test_verify_key() {
        assert!(verify_key("sekrit", "sekrit"));
        assert!(!verify_key("sekrit", "sekrit2")); // length differs
        assert!(!verify_key("sekrib", "sekrit"));
        assert!(!verify_key("", "sekrit"));
    }
}
