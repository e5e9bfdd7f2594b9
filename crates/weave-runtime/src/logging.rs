#![forbid(unsafe_code)]

//! Subscriber setup for hosts that do not install their own.
//!
//! Filtering follows the `WEAVE_LOG` environment variable (same syntax as
//! `RUST_LOG`), defaulting to `info`. With the `tracing-json` feature,
//! records are emitted as JSON lines.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Environment variable holding filter directives.
pub const LOG_ENV: &str = "WEAVE_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

/// Filter from `WEAVE_LOG`, or `info` when unset or malformed.
#[must_use]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails if a global subscriber is already set.
pub fn try_init() -> Result<(), TryInitError> {
    let registry = tracing_subscriber::registry().with(env_filter());
    #[cfg(feature = "tracing-json")]
    {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    }
    #[cfg(not(feature = "tracing-json"))]
    {
        registry
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init()
    }
}

/// Install the global subscriber unless one is already set.
pub fn init() {
    if try_init().is_err() {
        tracing::debug!("global subscriber already installed");
    }
}
