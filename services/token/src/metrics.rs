//! Prometheus metrics for the token lifecycle.
//!
//! Registered in the default registry on first use.

use once_cell::sync::Lazy;
use prometheus::{CounterVec, register_counter_vec};

/// Token pairs issued, by what triggered the issuance.
pub static TOKENS_ISSUED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "feedback_token_tokens_issued_total",
        "Total number of token pairs issued",
        &["trigger"]
    )
    .expect("Failed to register tokens_issued metric")
});

/// Refresh attempts, by outcome.
pub static TOKENS_REFRESHED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "feedback_token_refresh_total",
        "Total number of refresh attempts",
        &["status"]
    )
    .expect("Failed to register refresh metric")
});

/// Access token validations, by outcome.
pub static TOKEN_VALIDATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "feedback_token_validations_total",
        "Total number of access token validations",
        &["status"]
    )
    .expect("Failed to register validations metric")
});
