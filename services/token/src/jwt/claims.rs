//! Claim types carried in access tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity facts embedded in an access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClaimSet {
    /// Display name of the identity.
    pub sub: String,
    /// Unique token id (UUID v4).
    pub jti: String,
    /// Identity email.
    #[serde(default)]
    pub email: String,
    /// Stable identity id.
    #[serde(default)]
    pub uid: String,
    /// One entry per role, in the order the store returned them.
    #[serde(rename = "role", default)]
    pub roles: Vec<String>,
}

impl ClaimSet {
    /// Both lookup claims are present and non-empty.
    pub fn identifies_user(&self) -> bool {
        !self.uid.is_empty() && !self.email.is_empty()
    }
}

/// Full JWT payload: the claim set plus the registered envelope claims.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    /// Identity claims.
    #[serde(flatten)]
    pub claims: ClaimSet,
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: String,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    /// Issued at, seconds since the epoch.
    pub iat: i64,
    /// Not before, seconds since the epoch.
    pub nbf: i64,
}

impl AccessClaims {
    /// Wrap `claims` with the envelope for a token issued at `issued_at`.
    pub fn new(
        claims: ClaimSet,
        issuer: &str,
        audience: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        AccessClaims {
            claims,
            iss: issuer.to_string(),
            aud: audience.to_string(),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            nbf: issued_at.timestamp(),
        }
    }

    /// Expired once `now` reaches `exp`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// `now` is at or after `nbf`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.nbf
    }
}
