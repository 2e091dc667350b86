//! Refresh token and token id generation.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::RngCore;
use rand::rngs::OsRng;

/// Random bytes behind every refresh token (256 bits).
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Source of refresh tokens and `jti` values.
pub struct RefreshTokenGenerator;

impl RefreshTokenGenerator {
    /// Fresh opaque refresh token: 32 bytes from the OS CSPRNG, base64 encoded.
    pub fn generate() -> String {
        let mut random_bytes = [0u8; REFRESH_TOKEN_BYTES];
        OsRng.fill_bytes(&mut random_bytes);
        STANDARD.encode(random_bytes)
    }

    /// Unique token identifier for the `jti` claim.
    pub fn generate_jti() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}
