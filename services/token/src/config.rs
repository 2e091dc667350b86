//! Token lifecycle configuration.
//!
//! Loaded once at startup, validated, and handed to component constructors
//! by value. Nothing in the crate reads configuration after construction.

use crate::error::TokenError;
use chrono::Duration;
use std::env;
use std::fmt;
use zeroize::Zeroizing;

/// HS256 keys shorter than the hash output weaken the MAC.
pub const MIN_SECRET_LEN: usize = 32;

/// Default access token lifetime: 6 hours.
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 6 * 60 * 60;

/// Default refresh token lifetime: 7 days.
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Upper bound on the access token lifetime: 10 years.
pub const MAX_ACCESS_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Upper bound on the refresh token lifetime: 1 year.
pub const MAX_REFRESH_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Immutable token configuration.
#[derive(Clone)]
pub struct TokenConfig {
    signing_secret: Zeroizing<Vec<u8>>,
    issuer: String,
    audience: String,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
}

impl TokenConfig {
    /// Build a configuration with default lifetimes.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Config`] if the secret is shorter than
    /// [`MIN_SECRET_LEN`] bytes or the issuer/audience is blank.
    pub fn new(
        signing_secret: impl Into<Vec<u8>>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Result<Self, TokenError> {
        let signing_secret = Zeroizing::new(signing_secret.into());
        let issuer = issuer.into();
        let audience = audience.into();

        if signing_secret.len() < MIN_SECRET_LEN {
            return Err(TokenError::config(format!(
                "signing secret must be at least {MIN_SECRET_LEN} bytes, got {}",
                signing_secret.len()
            )));
        }
        if issuer.trim().is_empty() {
            return Err(TokenError::config("issuer must not be empty"));
        }
        if audience.trim().is_empty() {
            return Err(TokenError::config("audience must not be empty"));
        }

        Ok(Self {
            signing_secret,
            issuer,
            audience,
            access_token_ttl: Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS),
            refresh_token_ttl: Duration::seconds(DEFAULT_REFRESH_TOKEN_TTL_SECS),
        })
    }

    /// Override the access token lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Config`] for a non-positive lifetime or one
    /// above [`MAX_ACCESS_TOKEN_TTL_SECS`].
    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Result<Self, TokenError> {
        self.access_token_ttl = checked_ttl("access token TTL", ttl, MAX_ACCESS_TOKEN_TTL_SECS)?;
        Ok(self)
    }

    /// Override the refresh token lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Config`] for a non-positive lifetime or one
    /// above [`MAX_REFRESH_TOKEN_TTL_SECS`].
    pub fn with_refresh_token_ttl(mut self, ttl: Duration) -> Result<Self, TokenError> {
        self.refresh_token_ttl =
            checked_ttl("refresh token TTL", ttl, MAX_REFRESH_TOKEN_TTL_SECS)?;
        Ok(self)
    }

    /// Load configuration from environment variables (and `.env`, if present).
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, TokenError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TokenError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = require(&lookup, "JWT_SECRET_KEY")?;
        let issuer = require(&lookup, "JWT_ISSUER")?;
        let audience = require(&lookup, "JWT_AUDIENCE")?;

        let access_ttl = parse_var(&lookup, "ACCESS_TOKEN_TTL", DEFAULT_ACCESS_TOKEN_TTL_SECS)?;
        let refresh_ttl = parse_var(&lookup, "REFRESH_TOKEN_TTL", DEFAULT_REFRESH_TOKEN_TTL_SECS)?;

        Self::new(secret.into_bytes(), issuer, audience)?
            .with_access_token_ttl(ttl_from_secs("ACCESS_TOKEN_TTL", access_ttl)?)?
            .with_refresh_token_ttl(ttl_from_secs("REFRESH_TOKEN_TTL", refresh_ttl)?)
    }

    pub(crate) fn signing_secret(&self) -> &[u8] {
        &self.signing_secret
    }

    /// Expected `iss` claim.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Expected `aud` claim.
    #[must_use]
    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Lifetime stamped on every access token.
    #[must_use]
    pub const fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    /// Lifetime stamped on the stored refresh token at each rotation.
    #[must_use]
    pub const fn refresh_token_ttl(&self) -> Duration {
        self.refresh_token_ttl
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("signing_secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .finish()
    }
}

fn require<F>(lookup: &F, name: &str) -> Result<String, TokenError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).ok_or_else(|| TokenError::config(format!("{name} is not set")))
}

fn checked_ttl(what: &str, ttl: Duration, max_secs: i64) -> Result<Duration, TokenError> {
    if ttl <= Duration::zero() {
        return Err(TokenError::config(format!("{what} must be positive")));
    }
    if ttl.num_seconds() > max_secs {
        return Err(TokenError::config(format!(
            "{what} must not exceed {max_secs} seconds, got {}",
            ttl.num_seconds()
        )));
    }
    Ok(ttl)
}

fn ttl_from_secs(name: &str, secs: i64) -> Result<Duration, TokenError> {
    Duration::try_seconds(secs)
        .ok_or_else(|| TokenError::config(format!("Invalid {name}: {secs} seconds is out of range")))
}

/// Parse variable with default value.
fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, TokenError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match lookup(name) {
        Some(val) => val
            .parse()
            .map_err(|e| TokenError::config(format!("Invalid {name}: {e}"))),
        None => Ok(default),
    }
}
