//! Access token signing and pair issuance.

use crate::config::TokenConfig;
use crate::error::TokenError;
use crate::jwt::claims::{AccessClaims, ClaimSet};
use crate::refresh::generator::RefreshTokenGenerator;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The only algorithm this service signs or accepts.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Access/refresh pair handed back to the caller. Never stored as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Signed JWT
    pub access_token: String,
    /// Opaque refresh token
    pub refresh_token: String,
}

/// Signs claim sets into HS256 access tokens.
///
/// Stateless after construction; share it freely across threads.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    issuer: String,
    audience: String,
    access_token_ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer bound to the configured key, issuer and audience.
    #[must_use]
    pub fn new(config: &TokenConfig) -> Self {
        TokenIssuer {
            encoding_key: EncodingKey::from_secret(config.signing_secret()),
            issuer: config.issuer().to_string(),
            audience: config.audience().to_string(),
            access_token_ttl: config.access_token_ttl(),
        }
    }

    /// Sign `claims` into an access token expiring `access_token_ttl` after
    /// `now`, and pair it with a fresh refresh token.
    ///
    /// The refresh token is not persisted here.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Internal`] if the encoder fails.
    pub fn issue_token_pair(
        &self,
        claims: ClaimSet,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, TokenError> {
        let access_token = self.issue_access_token(claims, now)?;
        let refresh_token = RefreshTokenGenerator::generate();

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Sign `claims` into an access token only.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Internal`] if the expiry is not representable
    /// or the encoder fails.
    pub fn issue_access_token(
        &self,
        claims: ClaimSet,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let expires_at = now
            .checked_add_signed(self.access_token_ttl)
            .ok_or_else(|| TokenError::internal("access token expiry out of range"))?;
        let payload = AccessClaims::new(claims, &self.issuer, &self.audience, now, expires_at);

        let token = encode(&Header::new(SIGNING_ALGORITHM), &payload, &self.encoding_key)
            .map_err(|e| TokenError::internal(format!("JWT encoding failed: {e}")))?;

        debug!(jti = %payload.claims.jti, exp = %payload.exp, "Signed access token");
        Ok(token)
    }

    /// Lifetime added to `now` for each access token.
    #[must_use]
    pub const fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }
}
