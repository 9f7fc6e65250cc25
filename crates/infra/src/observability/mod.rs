//! Tracing subscriber setup
//!
//! Library code only emits `tracing` events. Applications call
//! [`init_tracing`] once at startup to print them, either human-readable or
//! as JSON lines. `RUST_LOG` overrides the filter passed in.

use sessionrelay_domain::impl_wire_name_conversions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl_wire_name_conversions!(LogFormat {
    Pretty => "pretty",
    Json => "json",
});

/// Tracing setup error
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    /// The filter directive could not be parsed
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    /// A global subscriber was already set
    #[error("Tracing subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

/// Install the global subscriber.
///
/// `default_filter` uses `EnvFilter` syntax, e.g.
/// `"sessionrelay_core=debug,info"`.
///
/// # Errors
/// Returns [`TracingError`] if the filter is invalid or a subscriber is
/// already installed.
pub fn init_tracing(default_filter: &str, format: LogFormat) -> Result<(), TracingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter).map_err(|e| TracingError::InvalidFilter {
            filter: default_filter.to_string(),
            reason: e.to_string(),
        })?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        LogFormat::Pretty => registry.with(fmt::layer()).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
    };

    installed.map_err(|e| TracingError::AlreadyInstalled(e.to_string()))
}
