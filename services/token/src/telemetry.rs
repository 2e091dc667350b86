//! Tracing subscriber setup for services embedding the token lifecycle.

use crate::error::TokenError;
use std::env;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter target of this crate's events.
const TOKEN_TARGET: &str = "feedback_token";

/// Subscriber settings, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Base filter directive, used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON lines instead of human-readable text
    pub json_output: bool,
    /// Level for token lifecycle events only. `debug` surfaces the cause of
    /// every rejected access token without raising the host's level.
    pub token_log_level: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_output: false,
            token_log_level: None,
        }
    }
}

impl TracingConfig {
    /// Read `LOG_LEVEL`, `LOG_FORMAT` and `TOKEN_LOG_LEVEL` from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Config`] for an unknown `LOG_FORMAT`.
    pub fn from_env() -> Result<Self, TokenError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`TracingConfig::from_env`] through an arbitrary lookup.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Config`] for an unknown `LOG_FORMAT`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TokenError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let json_output = match lookup("LOG_FORMAT") {
            None => defaults.json_output,
            Some(format) if format.eq_ignore_ascii_case("json") => true,
            Some(format) if format.eq_ignore_ascii_case("text") => false,
            Some(other) => {
                return Err(TokenError::config(format!(
                    "Invalid LOG_FORMAT: {other:?} (expected json or text)"
                )));
            }
        };

        Ok(Self {
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            json_output,
            token_log_level: lookup("TOKEN_LOG_LEVEL").filter(|level| !level.trim().is_empty()),
        })
    }

    /// Filter directives applied when `RUST_LOG` is unset.
    #[must_use]
    pub fn directives(&self) -> String {
        match &self.token_log_level {
            Some(level) => format!("{},{TOKEN_TARGET}={level}", self.log_level),
            None => self.log_level.clone(),
        }
    }
}

/// Install the global tracing subscriber. Call once at startup.
///
/// # Errors
///
/// Returns [`TokenError::Config`] if the directives do not parse or a global
/// subscriber is already set.
pub fn init_tracing(config: &TracingConfig) -> Result<(), TokenError> {
    let directives = config.directives();
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&directives)
            .map_err(|e| TokenError::config(format!("Invalid log filter {directives:?}: {e}")))?,
    };

    let result = if config.json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    };
    result.map_err(|e| TokenError::config(format!("tracing already initialised: {e}")))?;

    tracing::info!(filter = %directives, json = config.json_output, "Tracing initialised");
    Ok(())
}
