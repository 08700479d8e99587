//! opaque device tokens and their bindings to residents.
//!
//! a device token is minted once per phone and stored in a long-lived
//! cookie. the token carries no identity by itself; the binding row is
//! what ties it to a resident.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::resident::ResidentId;

/// an opaque device token.
///
/// tokens are compared by exact string equality and never parsed or
/// interpreted. freshly minted tokens happen to be hyphenated uuids,
/// but nothing anywhere may rely on that; any unique string a device
/// presents is a token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceToken(String);

impl DeviceToken {
    /// wrap a string as a token. no validation; tokens are opaque.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// mint a fresh random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().as_hyphenated().to_string())
    }

    /// get the token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// consume the token and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }

    /// whether the token is the empty string.
    ///
    /// the empty token never resolves to anyone; lookups must treat it
    /// as anonymous without touching storage.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// get a short prefix for logs.
    ///
    /// enough to correlate log lines without putting a usable credential
    /// into the log stream.
    pub fn prefix(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl fmt::Display for DeviceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DeviceToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DeviceToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for DeviceToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// a binding between a device token and a resident.
///
/// at most one binding per resident and one per token; re-binding a
/// resident replaces their old binding so a lost phone can't keep
/// checking in for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceBinding {
    /// unique identifier.
    pub id: u64,

    /// the resident this device belongs to.
    pub resident_id: ResidentId,

    /// the opaque token presented by the device.
    pub token: DeviceToken,

    /// when the binding was created.
    pub created_at: DateTime<Utc>,
}

impl DeviceBinding {
    /// create a new binding between a resident and a token.
    pub fn new(resident_id: ResidentId, token: DeviceToken) -> Self {
        Self {
            id: 0,
            resident_id,
            token,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_nonempty_and_distinct() {
        let a = DeviceToken::generate();
        let b = DeviceToken::generate();
        assert!(!a.is_empty());
        assert_ne!(a, b);
    }

    #[test]
    fn test_tokens_are_opaque() {
        // anything a device presents is a token, even junk
        let token = DeviceToken::new("definitely-not-a-uuid");
        assert_eq!(token.as_str(), "definitely-not-a-uuid");

        let empty = DeviceToken::new("");
        assert!(empty.is_empty());
    }

    #[test]
    fn test_equality_is_exact() {
        // no normalization: case matters
        let lower = DeviceToken::new("abc-def");
        let upper = DeviceToken::new("ABC-DEF");
        assert_ne!(lower, upper);
    }

    #[test]
    fn test_prefix_handles_short_tokens() {
        assert_eq!(DeviceToken::new("abc").prefix(), "abc");
        assert_eq!(
            DeviceToken::new("0b8f3c1e-5a2d-4f7b-9c6e-1d2a3b4c5d6e").prefix(),
            "0b8f3c1e"
        );
    }
}
