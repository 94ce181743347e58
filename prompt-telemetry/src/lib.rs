//! Tracing initialisation for binaries and tests.
//!
//! The renderer emits `debug!` events when optional sections are dropped and
//! when required sections overflow, and `warn!` events for malformed history.
//! `RUST_LOG` takes precedence over the default filter passed here.

#![warn(missing_docs, clippy::pedantic)]

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset and no default is given.
pub const DEFAULT_FILTER: &str = "info";

/// Errors raised while installing a subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The default filter directive did not parse.
    #[error("invalid tracing filter `{directive}`: {reason}")]
    InvalidFilter {
        /// Directive that failed.
        directive: String,
        /// Parser error.
        reason: String,
    },
    /// A global subscriber was already installed.
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

/// Result alias for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Builds the filter: `RUST_LOG` if set, otherwise `default_filter`.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] when `default_filter` is used
/// and does not parse.
pub fn env_filter(default_filter: &str) -> TelemetryResult<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(default_filter).map_err(|err| TelemetryError::InvalidFilter {
        directive: default_filter.to_owned(),
        reason: err.to_string(),
    })
}

/// Installs a global `fmt` subscriber.
///
/// # Errors
///
/// Returns an error when the filter is invalid or a subscriber is already
/// installed.
pub fn try_init_tracing(default_filter: &str) -> TelemetryResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter)?)
        .with_target(false)
        .try_init()
        .map_err(|err| TelemetryError::AlreadyInstalled(err.to_string()))
}

/// Installs a global `fmt` subscriber, ignoring a second installation.
///
/// An invalid `default_filter` falls back to [`DEFAULT_FILTER`].
pub fn init_tracing(default_filter: &str) {
    let filter = env_filter(default_filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
