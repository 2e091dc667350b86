//! Access token claims, signing and validation.

pub mod builder;
pub mod claims;
pub mod issuer;
pub mod validator;

pub use builder::ClaimsBuilder;
pub use claims::{AccessClaims, ClaimSet};
pub use issuer::{SIGNING_ALGORITHM, TokenIssuer, TokenPair};
pub use validator::{ExpiryPolicy, TokenValidator};
