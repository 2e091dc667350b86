//! Versioned refresh-token state of an identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// Refresh-token fields of an identity, kept apart from the rest of the
/// record so they can be swapped atomically.
///
/// `version` increments on every successful swap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenState {
    /// Current refresh token, if any.
    pub token: Option<String>,
    /// Instant the current token stops being accepted.
    pub expires_at: Option<DateTime<Utc>>,
    /// Number of successful swaps.
    pub version: u64,
}

impl RefreshTokenState {
    /// State holding `token` until `expires_at`, at version 0.
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        RefreshTokenState {
            token: Some(token.into()),
            expires_at: Some(expires_at),
            version: 0,
        }
    }

    /// Constant-time comparison against the stored value.
    pub fn is_current(&self, presented: &str) -> bool {
        self.token
            .as_deref()
            .is_some_and(|stored| bool::from(stored.as_bytes().ct_eq(presented.as_bytes())))
    }

    /// True while a token is stored and its expiry lies strictly after `now`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.token.is_some() && self.expires_at.is_some_and(|expires_at| expires_at > now)
    }

    /// Whether the stored token equals `expected` (`None` meaning "no token").
    pub fn matches(&self, expected: Option<&str>) -> bool {
        match expected {
            Some(expected) => self.is_current(expected),
            None => self.token.is_none(),
        }
    }

    /// Overwrite token and expiry and bump the version.
    pub fn replace(&mut self, token: Option<String>, expires_at: Option<DateTime<Utc>>) {
        self.token = token;
        self.expires_at = expires_at;
        self.version += 1;
    }
}
