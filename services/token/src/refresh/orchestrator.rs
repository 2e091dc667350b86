//! Login, refresh and logout over an [`IdentityStore`].

use crate::clock::{Clock, SystemClock};
use crate::config::TokenConfig;
use crate::error::TokenError;
use crate::jwt::builder::ClaimsBuilder;
use crate::jwt::issuer::{TokenIssuer, TokenPair};
use crate::jwt::validator::{ExpiryPolicy, TokenValidator};
use crate::metrics::{TOKENS_ISSUED, TOKENS_REFRESHED};
use crate::storage::{Identity, IdentityStore};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Body of a refresh call: the last access token (expired or not) and the
/// refresh token issued with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// Last access token issued to the client
    pub access_token: String,
    /// Refresh token issued alongside it
    pub refresh_token: String,
}

impl RefreshRequest {
    /// Request from its two tokens.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        RefreshRequest {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl From<TokenPair> for RefreshRequest {
    fn from(pair: TokenPair) -> Self {
        RefreshRequest {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }
    }
}

/// Issues token pairs for identities and rotates them on refresh.
///
/// Every successful issuance replaces the identity's stored refresh token
/// through a compare-and-swap, so at most one refresh token is live per
/// identity and a refresh token can be exchanged at most once.
pub struct RefreshOrchestrator<S: IdentityStore> {
    validator: TokenValidator,
    issuer: TokenIssuer,
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    refresh_token_ttl: Duration,
}

impl<S: IdentityStore> RefreshOrchestrator<S> {
    /// Orchestrator over `store`, driven by the system clock.
    pub fn new(config: &TokenConfig, store: Arc<S>) -> Self {
        RefreshOrchestrator {
            validator: TokenValidator::new(config),
            issuer: TokenIssuer::new(config),
            store,
            clock: Arc::new(SystemClock),
            refresh_token_ttl: config.refresh_token_ttl(),
        }
    }

    /// Replace the system clock, e.g. with a [`FixedClock`](crate::clock::FixedClock) in tests.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validator sharing this orchestrator's configuration.
    pub fn validator(&self) -> &TokenValidator {
        &self.validator
    }

    /// Issuer sharing this orchestrator's configuration.
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Issue a first pair for `identity_id` (login) and make its refresh
    /// token the identity's only live one.
    ///
    /// # Errors
    ///
    /// - [`TokenError::IdentityNotFound`] if the identity does not exist.
    /// - [`TokenError::InvalidToken`] if a concurrent issuance or refresh
    ///   replaced the stored token first.
    /// - [`TokenError::Store`] if the store fails.
    pub fn issue_for(&self, identity_id: &str) -> Result<TokenPair, TokenError> {
        let now = self.clock.now();
        let identity = self
            .store
            .find_by_id(identity_id)?
            .ok_or_else(|| TokenError::IdentityNotFound(identity_id.to_string()))?;

        let previous = identity.refresh.token.as_deref();
        let pair = self.rotate(&identity, previous, now)?;

        TOKENS_ISSUED.with_label_values(&["login"]).inc();
        Ok(pair)
    }

    /// Exchange an access/refresh pair for a new one.
    ///
    /// The access token may be expired but must otherwise be valid. The
    /// refresh token must be the identity's current one and unexpired.
    ///
    /// # Errors
    ///
    /// - [`TokenError::InvalidToken`] for any token problem, including losing
    ///   a race against a concurrent refresh with the same refresh token.
    /// - [`TokenError::IdentityNotFound`] if the token's identity is gone.
    /// - [`TokenError::Store`] if the store fails.
    pub fn refresh(&self, request: &RefreshRequest) -> Result<TokenPair, TokenError> {
        let now = self.clock.now();

        let claims = self
            .validator
            .validate(&request.access_token, ExpiryPolicy::Ignore, now)
            .map_err(|e| rejected("invalid_token", e))?;

        if !claims.identifies_user() {
            warn!(jti = %claims.jti, "Access token lacks identity claims");
            return Err(rejected("invalid_token", TokenError::InvalidToken));
        }

        let identity = self
            .store
            .find_by_id(&claims.uid)
            .map_err(|e| rejected("store_error", e))?
            .ok_or_else(|| {
                warn!(identity_id = %claims.uid, "Refresh for unknown identity");
                rejected("identity_not_found", TokenError::IdentityNotFound(claims.uid.clone()))
            })?;

        if !identity.refresh.is_current(&request.refresh_token) {
            warn!(identity_id = %identity.id, "Presented refresh token is not current");
            return Err(rejected("invalid_token", TokenError::InvalidToken));
        }
        if !identity.refresh.is_live_at(now) {
            warn!(
                identity_id = %identity.id,
                expired_at = ?identity.refresh.expires_at,
                "Refresh token expired"
            );
            return Err(rejected("invalid_token", TokenError::InvalidToken));
        }

        let pair = self
            .rotate(&identity, Some(&request.refresh_token), now)
            .map_err(|e| {
                let status = match e {
                    TokenError::InvalidToken => "race_lost",
                    TokenError::Store(_) => "store_error",
                    _ => "invalid_token",
                };
                rejected(status, e)
            })?;

        TOKENS_REFRESHED.with_label_values(&["success"]).inc();
        TOKENS_ISSUED.with_label_values(&["refresh"]).inc();
        Ok(pair)
    }

    /// Drop the identity's refresh token (logout). Access tokens already
    /// issued stay valid until they expire.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidToken`] if `refresh_token` is not the
    /// current one, or [`TokenError::Store`] if the store fails.
    pub fn revoke(&self, identity_id: &str, refresh_token: &str) -> Result<(), TokenError> {
        let revoked = self.store.compare_and_set_refresh_token(
            identity_id,
            Some(refresh_token),
            None,
            None,
        )?;

        if !revoked {
            warn!(identity_id = %identity_id, "Revocation with stale refresh token");
            return Err(TokenError::InvalidToken);
        }

        info!(identity_id = %identity_id, "Revoked refresh token");
        Ok(())
    }

    /// Build claims from the stored identity, sign a new pair and swap its
    /// refresh token in place of `expected`.
    fn rotate(
        &self,
        identity: &Identity,
        expected: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, TokenError> {
        let roles = self.store.roles(identity)?;
        let claims = ClaimsBuilder::build(identity, &roles);
        let jti = claims.jti.clone();

        let pair = self.issuer.issue_token_pair(claims, now)?;
        let expires_at = now
            .checked_add_signed(self.refresh_token_ttl)
            .ok_or_else(|| TokenError::internal("refresh token expiry out of range"))?;

        let swapped = self.store.compare_and_set_refresh_token(
            &identity.id,
            expected,
            Some(&pair.refresh_token),
            Some(expires_at),
        )?;

        if !swapped {
            warn!(
                identity_id = %identity.id,
                "Refresh token changed concurrently - discarding new pair"
            );
            return Err(TokenError::InvalidToken);
        }

        info!(
            identity_id = %identity.id,
            jti = %jti,
            refresh_expires_at = %expires_at,
            "Issued token pair"
        );

        Ok(pair)
    }
}

fn rejected(status: &'static str, error: TokenError) -> TokenError {
    TOKENS_REFRESHED.with_label_values(&[status]).inc();
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::refresh::state::RefreshTokenState;
    use crate::storage::InMemoryIdentityStore;
    use chrono::TimeZone;

    const SECRET: &str = "orchestrator-test-secret-32-bytes!!";

    struct Fixture {
        store: Arc<InMemoryIdentityStore>,
        clock: Arc<FixedClock>,
        orchestrator: RefreshOrchestrator<InMemoryIdentityStore>,
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap()
    }

    fn fixture() -> Fixture {
        let config = TokenConfig::new(SECRET, "feedback-api", "feedback-web").unwrap();
        let store = Arc::new(InMemoryIdentityStore::new());
        store.insert(
            Identity::new("user-1", "edsger@example.com", "Edsger Dijkstra")
                .with_roles(["Reader", "Moderator"]),
        );
        let clock = Arc::new(FixedClock::new(start()));
        let orchestrator =
            RefreshOrchestrator::new(&config, Arc::clone(&store)).with_clock(clock.clone());

        Fixture {
            store,
            clock,
            orchestrator,
        }
    }

    #[test]
    fn test_issue_for_stores_refresh_token() {
        let f = fixture();

        let pair = f.orchestrator.issue_for("user-1").unwrap();

        let state = f.store.refresh_state("user-1").unwrap();
        assert!(state.is_current(&pair.refresh_token));
        assert_eq!(state.expires_at, Some(start() + Duration::days(7)));

        let claims = f
            .orchestrator
            .validator()
            .validate_access_token(&pair.access_token, start())
            .unwrap();
        assert_eq!(claims.uid, "user-1");
        assert_eq!(claims.roles, vec!["Reader".to_string(), "Moderator".to_string()]);
    }

    #[test]
    fn test_issue_for_unknown_identity() {
        let f = fixture();
        assert_eq!(
            f.orchestrator.issue_for("ghost"),
            Err(TokenError::IdentityNotFound("ghost".to_string()))
        );
    }

    #[test]
    fn test_second_login_invalidates_first_refresh_token() {
        let f = fixture();
        let first = f.orchestrator.issue_for("user-1").unwrap();
        let second = f.orchestrator.issue_for("user-1").unwrap();

        assert_eq!(
            f.orchestrator.refresh(&first.into()),
            Err(TokenError::InvalidToken)
        );
        assert!(f.orchestrator.refresh(&second.into()).is_ok());
    }

    #[test]
    fn test_refresh_after_access_token_expiry() {
        let f = fixture();
        let pair = f.orchestrator.issue_for("user-1").unwrap();

        f.clock.advance(Duration::hours(7));
        let refreshed = f.orchestrator.refresh(&pair.clone().into()).unwrap();

        assert_ne!(refreshed.refresh_token, pair.refresh_token);
        assert!(
            f.orchestrator
                .validator()
                .validate_access_token(&refreshed.access_token, f.clock.now())
                .is_ok()
        );
        let state = f.store.refresh_state("user-1").unwrap();
        assert_eq!(state.version, 2);
        assert_eq!(state.expires_at, Some(f.clock.now() + Duration::days(7)));
    }

    #[test]
    fn test_refresh_with_expired_refresh_token() {
        let f = fixture();
        let pair = f.orchestrator.issue_for("user-1").unwrap();

        f.clock.advance(Duration::days(7));

        assert_eq!(
            f.orchestrator.refresh(&pair.into()),
            Err(TokenError::InvalidToken)
        );
    }

    #[test]
    fn test_refresh_for_removed_identity() {
        let f = fixture();
        let pair = f.orchestrator.issue_for("user-1").unwrap();
        f.store.remove("user-1");

        assert_eq!(
            f.orchestrator.refresh(&pair.into()),
            Err(TokenError::IdentityNotFound("user-1".to_string()))
        );
    }

    #[test]
    fn test_refresh_rejects_token_without_identity_claims() {
        let f = fixture();
        let anonymous = crate::jwt::claims::ClaimSet {
            sub: "nobody".to_string(),
            jti: "jti-anon".to_string(),
            email: String::new(),
            uid: String::new(),
            roles: Vec::new(),
        };
        let access_token = f
            .orchestrator
            .issuer()
            .issue_access_token(anonymous, start())
            .unwrap();

        let result = f
            .orchestrator
            .refresh(&RefreshRequest::new(access_token, "whatever"));
        assert_eq!(result, Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_refresh_with_no_stored_token() {
        let f = fixture();
        f.store.insert(
            Identity::new("user-2", "tony@example.com", "Tony Hoare")
                .with_refresh_state(RefreshTokenState::default()),
        );
        let claims = ClaimsBuilder::build(&f.store.find_by_id("user-2").unwrap().unwrap(), &[]);
        let access_token = f
            .orchestrator
            .issuer()
            .issue_access_token(claims, start())
            .unwrap();

        let result = f.orchestrator.refresh(&RefreshRequest::new(access_token, ""));
        assert_eq!(result, Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_unrepresentable_refresh_expiry_leaves_store_untouched() {
        let f = fixture();
        f.clock.set(DateTime::<Utc>::MAX_UTC - Duration::days(1));

        let result = f.orchestrator.issue_for("user-1");

        assert!(matches!(result, Err(TokenError::Internal(_))));
        assert_eq!(
            f.store.refresh_state("user-1").unwrap(),
            RefreshTokenState::default()
        );
    }

    #[test]
    fn test_revoke() {
        let f = fixture();
        let pair = f.orchestrator.issue_for("user-1").unwrap();

        assert_eq!(
            f.orchestrator.revoke("user-1", "not-the-token"),
            Err(TokenError::InvalidToken)
        );
        f.orchestrator.revoke("user-1", &pair.refresh_token).unwrap();

        assert!(f.store.refresh_state("user-1").unwrap().token.is_none());
        assert_eq!(
            f.orchestrator.refresh(&pair.into()),
            Err(TokenError::InvalidToken)
        );
    }

    #[test]
    fn test_request_wire_format() {
        let request: RefreshRequest = serde_json::from_value(serde_json::json!({
            "accessToken": "a.b.c",
            "refreshToken": "r"
        }))
        .unwrap();
        assert_eq!(request, RefreshRequest::new("a.b.c", "r"));
    }
}
