//! Access token validation.
//!
//! Signature, issuer and audience are always verified. Lifetime is verified
//! only when the caller asks for it: the refresh flow must be able to read
//! claims out of an access token that has already expired.

use crate::config::TokenConfig;
use crate::error::TokenError;
use crate::jwt::claims::{AccessClaims, ClaimSet};
use crate::jwt::issuer::SIGNING_ALGORITHM;
use crate::metrics::TOKEN_VALIDATIONS;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::Deserialize;
use tracing::debug;

/// Whether `exp`/`nbf` take part in validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryPolicy {
    /// Reject tokens outside their validity window.
    Enforce,
    /// Accept expired tokens; used only to recover claims for a refresh.
    Ignore,
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Verifies HS256 access tokens issued with the configured secret.
pub struct TokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    /// Create a validator pinned to HS256 and the configured issuer/audience.
    #[must_use]
    pub fn new(config: &TokenConfig) -> Self {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        // Lifetime is checked against the injected clock instead.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_issuer(&[config.issuer()]);
        validation.set_audience(&[config.audience()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        TokenValidator {
            decoding_key: DecodingKey::from_secret(config.signing_secret()),
            validation,
        }
    }

    /// Validate `token` and return its claim set.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidToken`] for every failure, whatever the
    /// cause. The cause is only logged at debug level.
    pub fn validate(
        &self,
        token: &str,
        policy: ExpiryPolicy,
        now: DateTime<Utc>,
    ) -> Result<ClaimSet, TokenError> {
        let result = self.validate_inner(token, policy, now);
        let status = match &result {
            Ok(_) => "valid",
            Err(reason) => {
                debug!(reason = %reason, policy = ?policy, "Access token rejected");
                "invalid"
            }
        };
        TOKEN_VALIDATIONS.with_label_values(&[status]).inc();

        result.map_err(|_| TokenError::InvalidToken)
    }

    /// Bearer authentication: full validation including lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidToken`] if the token is not acceptable.
    pub fn validate_access_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<ClaimSet, TokenError> {
        self.validate(token, ExpiryPolicy::Enforce, now)
    }

    fn validate_inner(
        &self,
        token: &str,
        policy: ExpiryPolicy,
        now: DateTime<Utc>,
    ) -> Result<ClaimSet, String> {
        // Checked on the raw header so that a token naming any other
        // algorithm is refused before the decoder sees it.
        let alg = declared_algorithm(token)?;
        if !alg.eq_ignore_ascii_case("HS256") {
            return Err(format!("unexpected signing algorithm {alg:?}"));
        }

        let data = decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| format!("decode failed: {e}"))?;
        let claims = data.claims;

        if policy == ExpiryPolicy::Enforce {
            if claims.is_expired_at(now) {
                return Err(format!("expired (exp={}, now={})", claims.exp, now.timestamp()));
            }
            if !claims.is_active_at(now) {
                return Err(format!("not yet valid (nbf={}, now={})", claims.nbf, now.timestamp()));
            }
        }

        Ok(claims.claims)
    }
}

fn declared_algorithm(token: &str) -> Result<String, String> {
    let header = token
        .split('.')
        .next()
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| "missing header segment".to_string())?;
    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|e| format!("header is not base64url: {e}"))?;
    let header: RawHeader =
        serde_json::from_slice(&bytes).map_err(|e| format!("header is not JSON: {e}"))?;
    Ok(header.alg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::issuer::TokenIssuer;
    use chrono::{Duration, TimeZone};
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};

    const SECRET: &str = "validator-test-secret-32-bytes-long!";

    fn config() -> TokenConfig {
        TokenConfig::new(SECRET, "feedback-api", "feedback-web").unwrap()
    }

    fn claims() -> ClaimSet {
        ClaimSet {
            sub: "Barbara".to_string(),
            jti: "jti-v".to_string(),
            email: "barbara@example.com".to_string(),
            uid: "user-9".to_string(),
            roles: vec!["Admin".to_string()],
        }
    }

    fn issued_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap()
    }

    fn sign_with(config: &TokenConfig, alg: Algorithm, secret: &str) -> String {
        let now = issued_at();
        let payload = AccessClaims::new(
            claims(),
            config.issuer(),
            config.audience(),
            now,
            now + Duration::hours(6),
        );
        encode(&Header::new(alg), &payload, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_valid_token_round_trip() {
        let config = config();
        let token = TokenIssuer::new(&config)
            .issue_access_token(claims(), issued_at())
            .unwrap();

        let validator = TokenValidator::new(&config);
        let decoded = validator
            .validate_access_token(&token, issued_at() + Duration::hours(1))
            .unwrap();

        assert_eq!(decoded, claims());
    }

    #[test]
    fn test_expired_token_only_passes_when_ignored() {
        let config = config();
        let token = TokenIssuer::new(&config)
            .issue_access_token(claims(), issued_at())
            .unwrap();
        let validator = TokenValidator::new(&config);
        let later = issued_at() + Duration::days(2);

        assert_eq!(
            validator.validate(&token, ExpiryPolicy::Enforce, later),
            Err(TokenError::InvalidToken)
        );
        assert_eq!(
            validator.validate(&token, ExpiryPolicy::Ignore, later).unwrap(),
            claims()
        );
    }

    #[test]
    fn test_not_yet_valid_token_rejected() {
        let config = config();
        let token = TokenIssuer::new(&config)
            .issue_access_token(claims(), issued_at())
            .unwrap();
        let validator = TokenValidator::new(&config);

        let result = validator.validate_access_token(&token, issued_at() - Duration::seconds(1));
        assert_eq!(result, Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let config = config();
        let token = sign_with(&config, Algorithm::HS256, "some-other-secret-also-32-bytes-long");
        let validator = TokenValidator::new(&config);

        let result = validator.validate(&token, ExpiryPolicy::Ignore, issued_at());
        assert_eq!(result, Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_wrong_issuer_or_audience_rejected() {
        let token = TokenIssuer::new(&config())
            .issue_access_token(claims(), issued_at())
            .unwrap();

        let other_issuer = TokenConfig::new(SECRET, "someone-else", "feedback-web").unwrap();
        let other_audience = TokenConfig::new(SECRET, "feedback-api", "mobile-app").unwrap();

        for config in [other_issuer, other_audience] {
            let result =
                TokenValidator::new(&config).validate(&token, ExpiryPolicy::Ignore, issued_at());
            assert_eq!(result, Err(TokenError::InvalidToken));
        }
    }

    #[test]
    fn test_other_hmac_algorithm_rejected() {
        let config = config();
        let validator = TokenValidator::new(&config);

        for alg in [Algorithm::HS384, Algorithm::HS512] {
            let token = sign_with(&config, alg, SECRET);
            let result = validator.validate(&token, ExpiryPolicy::Ignore, issued_at());
            assert_eq!(result, Err(TokenError::InvalidToken));
        }
    }

    #[test]
    fn test_unsigned_token_rejected() {
        let config = config();
        let signed = sign_with(&config, Algorithm::HS256, SECRET);
        let payload = signed.split('.').nth(1).unwrap();
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let unsigned = format!("{header}.{payload}.");

        let validator = TokenValidator::new(&config);
        let result = validator.validate(&unsigned, ExpiryPolicy::Ignore, issued_at());
        assert_eq!(result, Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_garbage_rejected() {
        let validator = TokenValidator::new(&config());
        for token in ["", "abc", "a.b.c", "..", "eyJhbGciOiJIUzI1NiJ9.e30"] {
            let result = validator.validate(token, ExpiryPolicy::Ignore, issued_at());
            assert_eq!(result, Err(TokenError::InvalidToken), "token {token:?}");
        }
    }

    #[test]
    fn test_declared_algorithm() {
        let token = sign_with(&config(), Algorithm::HS512, SECRET);
        assert_eq!(declared_algorithm(&token).unwrap(), "HS512");
        assert!(declared_algorithm("").is_err());
    }
}
