//! Identity store seam.
//!
//! The user store is owned by the surrounding application. This crate only
//! reads identities and asks for conditional updates of their refresh-token
//! state.

pub mod identity;
pub mod memory;

pub use identity::Identity;
pub use memory::InMemoryIdentityStore;

use crate::error::TokenError;
use chrono::{DateTime, Utc};

/// Operations the token lifecycle needs from the user store.
///
/// Implementations must make [`compare_and_set_refresh_token`] atomic per
/// identity. Updates to different identities must not serialize on each
/// other.
///
/// [`compare_and_set_refresh_token`]: IdentityStore::compare_and_set_refresh_token
pub trait IdentityStore: Send + Sync {
    /// Look up an identity by its stable id.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Store`] if the store cannot be reached.
    fn find_by_id(&self, id: &str) -> Result<Option<Identity>, TokenError>;

    /// Role names of `identity`, in store order.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Store`] if the store cannot be reached.
    fn roles(&self, identity: &Identity) -> Result<Vec<String>, TokenError>;

    /// Replace the stored refresh token with `new_value`/`new_expiry` if and
    /// only if the stored token currently equals `expected`.
    ///
    /// `None` for `expected` means "no token stored"; `None` for `new_value`
    /// clears the token. Returns `Ok(false)` when the condition does not hold
    /// or the identity is gone.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Store`] if the store cannot be reached.
    fn compare_and_set_refresh_token(
        &self,
        id: &str,
        expected: Option<&str>,
        new_value: Option<&str>,
        new_expiry: Option<DateTime<Utc>>,
    ) -> Result<bool, TokenError>;
}
