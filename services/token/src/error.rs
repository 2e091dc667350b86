//! Error taxonomy for the token lifecycle.
//!
//! Every public operation returns one of these kinds. Validation failures
//! are deliberately collapsed into [`TokenError::InvalidToken`] so callers
//! cannot learn which check rejected a token.

use thiserror::Error;

/// Token lifecycle errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Signing key, issuer or audience unusable. Raised at construction only.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any token or refresh-token check failed.
    #[error("The provided token is not valid.")]
    InvalidToken,

    /// The identity named by the token does not exist.
    #[error("The user with id = {0} was not found")]
    IdentityNotFound(String),

    /// The external identity store failed.
    #[error("Identity store error: {0}")]
    Store(String),

    /// Unexpected failure inside the crate.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TokenError {
    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an identity store error.
    #[must_use]
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Only store outages are worth retrying; every other kind is final.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Stable error code for this kind.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => TOKEN_CONFIG_INVALID,
            Self::InvalidToken => USER_NOT_VALID_TOKEN,
            Self::IdentityNotFound(_) => USER_NOT_FOUND,
            Self::Store(_) => TOKEN_STORE_UNAVAILABLE,
            Self::Internal(_) => TOKEN_INTERNAL,
        }
    }

    /// Error code safe to send to an unauthenticated caller.
    ///
    /// `IdentityNotFound` is reported as an invalid token here so that the
    /// refresh endpoint cannot be used to probe for registered accounts.
    #[must_use]
    pub const fn public_code(&self) -> &'static str {
        match self {
            Self::IdentityNotFound(_) => USER_NOT_VALID_TOKEN,
            other => other.code(),
        }
    }
}

// Error codes shared with the API layer

/// Code for [`TokenError::InvalidToken`].
pub const USER_NOT_VALID_TOKEN: &str = "User.NotValidToken";
/// Code for [`TokenError::IdentityNotFound`].
pub const USER_NOT_FOUND: &str = "User.NotFound";
/// Code for [`TokenError::Config`].
pub const TOKEN_CONFIG_INVALID: &str = "Token.ConfigInvalid";
/// Code for [`TokenError::Store`].
pub const TOKEN_STORE_UNAVAILABLE: &str = "Token.StoreUnavailable";
/// Code for [`TokenError::Internal`].
pub const TOKEN_INTERNAL: &str = "Token.Internal";
