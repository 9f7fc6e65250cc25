//! Conversions from external infrastructure errors into session errors.

use std::time::Duration;

use reqwest::Error as HttpError;
use sessionrelay_domain::SessionError;
use url::ParseError as UrlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub SessionError);

impl From<InfraError> for SessionError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SessionError> for InfraError {
    fn from(value: SessionError) -> Self {
        Self(value)
    }
}

/// Conversion that needs the request timeout to report `Timeout` faithfully
pub trait IntoSessionError {
    fn into_session_error(self, timeout: Duration) -> SessionError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SessionError */
/* -------------------------------------------------------------------------- */

impl IntoSessionError for HttpError {
    fn into_session_error(self, timeout: Duration) -> SessionError {
        if self.is_timeout() {
            return SessionError::Timeout(timeout);
        }

        if self.is_connect() {
            return SessionError::Network(format!("HTTP connection failure: {self}"));
        }

        if let Some(status) = self.status() {
            return SessionError::from_status(
                status.as_u16(),
                status.canonical_reason().map(str::to_string),
            );
        }

        if self.is_decode() {
            return SessionError::Decode(self.to_string());
        }

        if self.is_builder() {
            return SessionError::InvalidInput(format!("Invalid request: {self}"));
        }

        SessionError::Network(self.to_string())
    }
}

/* -------------------------------------------------------------------------- */
/* url::ParseError → SessionError */
/* -------------------------------------------------------------------------- */

impl From<UrlError> for InfraError {
    fn from(value: UrlError) -> Self {
        Self(SessionError::Config(format!("Invalid base URL: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
