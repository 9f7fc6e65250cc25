//! # SessionRelay Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The reqwest transport with its cookie-backed session
//! - Conversions from reqwest/url errors into `SessionError`
//! - Configuration loading (environment, `.env`, JSON/TOML files)
//! - Tracing subscriber setup
//!
//! ## Architecture
//! - Implements traits defined in `sessionrelay-core`
//! - Contains all "impure" code (network, files, environment)

pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

use std::sync::Arc;

use sessionrelay_core::{RefreshCoordinator, SessionClient, SessionService, Transport};
use sessionrelay_domain::{ClientConfig, Result};

// Re-export commonly used items
pub use http::{HttpTransport, HttpTransportBuilder};
pub use observability::{init_tracing, LogFormat};

/// Wire a [`SessionClient`] to an [`HttpTransport`] built from `config`.
///
/// # Errors
/// Returns `SessionError::Config` if the base URL cannot be resolved.
pub fn connect(config: &ClientConfig) -> Result<SessionClient> {
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::from_config(config)?);
    let coordinator = RefreshCoordinator::new(Arc::clone(&transport), config.refresh.clone());

    tracing::info!(base_url = %config.resolved_base_url()?, "session client ready");
    Ok(SessionClient::new(transport, coordinator))
}

/// [`connect`], wrapped in a [`SessionService`] for account operations.
///
/// # Errors
/// Same as [`connect`].
pub fn connect_service(config: &ClientConfig) -> Result<SessionService> {
    connect(config).map(SessionService::new)
}
