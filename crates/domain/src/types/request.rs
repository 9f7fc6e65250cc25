//! Request and response records exchanged with the transport
//!
//! An [`ApiRequest`] is immutable once built: replaying a request after a
//! credential refresh reuses the very same record and only changes the
//! [`Attempt`] passed next to it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::{Result, SessionError};
use crate::impl_wire_name_conversions;

/// HTTP methods supported by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl_wire_name_conversions!(HttpMethod {
    Get => "GET",
    Post => "POST",
    Put => "PUT",
    Patch => "PATCH",
    Delete => "DELETE",
});

/// Which try of a request is being sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attempt {
    /// Original send; a 401 here is eligible for refresh-and-replay
    First,
    /// Reissue after a successful refresh; a 401 here is terminal
    Replay,
}

impl Attempt {
    /// Whether the request has already been retried once.
    pub const fn retried(self) -> bool {
        matches!(self, Self::Replay)
    }

    /// Attempt number for logs (1-based).
    pub const fn number(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Replay => 2,
        }
    }
}

/// Immutable description of one logical API call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    id: Uuid,
    method: HttpMethod,
    path: String,
    body: Option<Value>,
    headers: Vec<(String, String)>,
}

impl ApiRequest {
    /// Create a request for `path`, relative to the API base URL.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self { id: Uuid::now_v7(), method, path: path.into(), body: None, headers: Vec::new() }
    }

    /// `GET` request for `path`.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// `POST` request for `path` with no body.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach a JSON body, replacing `None` with no body at all.
    #[must_use]
    pub fn with_optional_body(mut self, body: Option<Value>) -> Self {
        self.body = body;
        self
    }

    /// Serialize `body` into JSON and attach it.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidInput` if `body` cannot be serialized.
    pub fn with_json<T: Serialize + ?Sized>(self, body: &T) -> Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| SessionError::InvalidInput(format!("Failed to serialize body: {e}")))?;
        Ok(self.with_body(value))
    }

    /// Add an extra header sent on every attempt of this request.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Correlation id, stable across the first attempt and the replay.
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// HTTP method.
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// Path relative to the base URL.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// JSON body, if any.
    pub const fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Extra headers, in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

/// Successful (2xx) response from the remote API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Decoded JSON body; `Value::Null` when the body was empty
    pub body: Value,
}

impl ApiResponse {
    /// Wrap a decoded response.
    pub const fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Deserialize the body into `T`.
    ///
    /// 204/205 responses carry no body and deserialize from `null`, which
    /// works for `()` and `Option<_>`.
    ///
    /// # Errors
    /// Returns `SessionError::Decode` if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.body.clone()).map_err(|e| {
            if self.body.is_null() {
                SessionError::Decode(format!(
                    "No content response ({}), cannot deserialize an empty body",
                    self.status
                ))
            } else {
                SessionError::Decode(e.to_string())
            }
        })
    }

    /// Server message field (`{"message": "..."}`), if present.
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn attempt_marks_replay_as_retried() {
        assert!(!Attempt::First.retried());
        assert!(Attempt::Replay.retried());
        assert_eq!(Attempt::Replay.number(), 2);
    }

    #[test]
    fn request_builder_keeps_everything() {
        let request = ApiRequest::new(HttpMethod::Patch, "/cart/updateQuantity/42")
            .with_body(json!({ "quantity": 3 }))
            .with_header("X-Trace", "abc");

        assert_eq!(request.method(), HttpMethod::Patch);
        assert_eq!(request.path(), "/cart/updateQuantity/42");
        assert_eq!(request.body(), Some(&json!({ "quantity": 3 })));
        assert_eq!(request.headers(), &[("X-Trace".to_string(), "abc".to_string())]);
    }

    #[test]
    fn cloned_request_keeps_correlation_id() {
        let request = ApiRequest::get("/products");
        let copy = request.clone();
        assert_eq!(request.id(), copy.id());
        assert_ne!(request.id(), ApiRequest::get("/products").id());
    }

    #[test]
    fn method_parses_from_config_strings() {
        assert_eq!("delete".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
        assert_eq!(HttpMethod::Put.to_string(), "PUT");
    }

    #[test]
    fn no_content_decodes_into_unit() {
        let response = ApiResponse::new(204, Value::Null);
        assert!(response.json::<()>().is_ok());
        assert_eq!(response.json::<Option<String>>().unwrap(), None);
    }

    #[test]
    fn decode_error_mentions_empty_body() {
        #[derive(Debug, Deserialize)]
        struct Cart {
            #[allow(dead_code)]
            cart: Vec<Value>,
        }

        let err = ApiResponse::new(205, Value::Null).json::<Cart>().unwrap_err();
        assert!(matches!(err, SessionError::Decode(msg) if msg.contains("205")));
    }

    #[test]
    fn message_reads_server_message_field() {
        let response = ApiResponse::new(200, json!({ "message": "Added to cart" }));
        assert_eq!(response.message(), Some("Added to cart"));
    }
}
