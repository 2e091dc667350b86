//! Identity record.

use crate::refresh::state::RefreshTokenState;
use serde::{Deserialize, Serialize};

/// Read model of a platform user, as seen by the token lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Stable identity id.
    pub id: String,
    /// Unique email.
    pub email: String,
    /// Name used as the token subject.
    pub display_name: String,
    /// Role names, in store order.
    pub roles: Vec<String>,
    /// Refresh-token state, replaced only through compare-and-swap.
    #[serde(default)]
    pub refresh: RefreshTokenState,
}

impl Identity {
    /// Identity with no roles and no refresh token.
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Identity {
            id: id.into(),
            email: email.into(),
            display_name: display_name.into(),
            roles: Vec::new(),
            refresh: RefreshTokenState::default(),
        }
    }

    /// Replace the role list.
    #[must_use]
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the refresh-token state.
    #[must_use]
    pub fn with_refresh_state(mut self, refresh: RefreshTokenState) -> Self {
        self.refresh = refresh;
        self
    }
}
