//! Token lifecycle for the feedback platform.
//!
//! Issues HS256 access tokens with opaque refresh tokens, validates access
//! tokens (optionally ignoring expiry so claims can be recovered for a
//! refresh), and rotates refresh tokens through a compare-and-swap on the
//! identity store.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod error;
pub mod jwt;
pub mod metrics;
pub mod refresh;
pub mod storage;
pub mod telemetry;

// Re-exports for convenience
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::TokenConfig;
pub use error::TokenError;
pub use jwt::{ClaimSet, ClaimsBuilder, ExpiryPolicy, TokenIssuer, TokenPair, TokenValidator};
pub use refresh::{RefreshOrchestrator, RefreshRequest};
pub use storage::{Identity, IdentityStore, InMemoryIdentityStore};
