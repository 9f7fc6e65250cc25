//! Port interfaces for the session client
//!
//! These traits define the boundaries between the coordination logic and
//! infrastructure (the HTTP stack) or application code (session consumers).

use async_trait::async_trait;
use sessionrelay_domain::{ApiRequest, ApiResponse, Attempt, Result, SessionEnd};

/// Performs exactly one HTTP exchange
///
/// Implementations attach session credentials themselves (e.g. through a
/// cookie store) and must be safe to call again with the same request and
/// [`Attempt::Replay`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and normalize the outcome.
    ///
    /// # Errors
    /// - `SessionError::Unauthorized` for HTTP 401
    /// - `SessionError::Status` for any other non-success status
    /// - `SessionError::Network` / `SessionError::Timeout` when no response
    ///   was received
    async fn send(&self, request: &ApiRequest, attempt: Attempt) -> Result<ApiResponse>;
}

/// Consumer of session lifecycle changes (e.g. clears a displayed user)
pub trait SessionListener: Send + Sync {
    /// Called once each time the session ends.
    fn on_session_ended(&self, end: &SessionEnd);
}
