//! Error types returned to callers of the session client

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a [`SessionError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Connectivity failure or timeout; never triggers a refresh
    Network,
    /// The server answered 401
    Unauthorized,
    /// The shared refresh operation failed; the session has ended
    RefreshFailed,
    /// Any other non-success HTTP status
    Status,
    /// Response body could not be decoded into the requested type
    Decode,
    /// Request rejected locally before reaching the network
    InvalidInput,
    /// Client misconfiguration
    Config,
    /// Invariant violated inside the client
    Internal,
}

/// Main error type for SessionRelay
///
/// Values are `Clone` so a single refresh failure can be handed to every
/// waiting caller unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum SessionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Authentication failed (HTTP {status}){}", suffix(.message.as_deref()))]
    Unauthorized { status: u16, message: Option<String> },

    #[error("Session refresh failed: {0}")]
    RefreshFailed(Box<SessionError>),

    #[error("HTTP {status}{}", suffix(.message.as_deref()))]
    Status { status: u16, message: Option<String> },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn suffix(message: Option<&str>) -> String {
    message.map(|m| format!(": {m}")).unwrap_or_default()
}

impl SessionError {
    /// Build an error from a non-success HTTP status and the server's message.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        if status == 401 {
            Self::Unauthorized { status, message }
        } else {
            Self::Status { status, message }
        }
    }

    /// Wrap the error produced by the refresh call.
    ///
    /// An error that is already a refresh failure is returned as-is so the
    /// cause is never nested twice.
    #[must_use]
    pub fn refresh_failed(cause: Self) -> Self {
        match cause {
            already @ Self::RefreshFailed(_) => already,
            other => Self::RefreshFailed(Box::new(other)),
        }
    }

    /// Get the kind of this error
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) | Self::Timeout(_) => ErrorKind::Network,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::RefreshFailed(_) => ErrorKind::RefreshFailed,
            Self::Status { .. } => ErrorKind::Status,
            Self::Decode(_) => ErrorKind::Decode,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Config(_) => ErrorKind::Config,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Server-provided message, if the response carried one.
    ///
    /// For refresh failures this is the message of the refresh response.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { message, .. } | Self::Status { message, .. } => {
                message.as_deref()
            }
            Self::RefreshFailed(cause) => cause.message(),
            _ => None,
        }
    }

    /// HTTP status attached to the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status, .. } | Self::Status { status, .. } => Some(*status),
            Self::RefreshFailed(cause) => cause.status(),
            _ => None,
        }
    }

    /// True for a plain 401 (not a wrapped refresh failure).
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// Result type alias for SessionRelay operations
pub type Result<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_401_becomes_unauthorized() {
        let err = SessionError::from_status(401, Some("Access token expired".into()));
        assert!(err.is_unauthorized());
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.message(), Some("Access token expired"));
    }

    #[test]
    fn other_statuses_pass_through() {
        let err = SessionError::from_status(404, None);
        assert_eq!(err.kind(), ErrorKind::Status);
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "HTTP 404");
    }

    #[test]
    fn refresh_failure_exposes_cause_message() {
        let cause = SessionError::from_status(401, Some("No refresh token provided".into()));
        let err = SessionError::refresh_failed(cause.clone());

        assert_eq!(err.kind(), ErrorKind::RefreshFailed);
        assert_eq!(err.message(), Some("No refresh token provided"));
        assert_eq!(err.status(), Some(401));
        assert_eq!(err, SessionError::RefreshFailed(Box::new(cause)));
    }

    #[test]
    fn refresh_failure_is_not_nested_twice() {
        let once = SessionError::refresh_failed(SessionError::Network("down".into()));
        let twice = SessionError::refresh_failed(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn display_includes_server_message() {
        let err = SessionError::Unauthorized { status: 401, message: Some("expired".into()) };
        assert_eq!(err.to_string(), "Authentication failed (HTTP 401): expired");
    }

    #[test]
    fn serializes_with_type_tag() {
        let err = SessionError::Network("connection refused".into());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "Network");
        assert_eq!(json["detail"], "connection refused");
    }
}
