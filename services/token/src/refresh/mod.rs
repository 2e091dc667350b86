//! Refresh token generation, state and rotation.

pub mod generator;
pub mod orchestrator;
pub mod state;

pub use generator::RefreshTokenGenerator;
pub use orchestrator::{RefreshOrchestrator, RefreshRequest};
pub use state::RefreshTokenState;
