use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Method};
use serde_json::Value;
use sessionrelay_core::Transport;
use sessionrelay_domain::constants::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use sessionrelay_domain::{
    ApiRequest, ApiResponse, Attempt, ClientConfig, HttpMethod, Result, SessionError,
};
use tracing::debug;
use url::Url;

use crate::errors::{InfraError, IntoSessionError};

/// reqwest-backed [`Transport`] that keeps the session in a cookie store.
///
/// Performs exactly one exchange per call. Retrying is the session client's
/// job, and only after a refresh.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: ReqwestClient,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Start building a new transport.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    /// Transport for the base URL, timeout and user agent in `config`.
    ///
    /// # Errors
    /// Returns `SessionError::Config` if the base URL cannot be resolved or
    /// parsed.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::builder()
            .base_url(config.resolved_base_url()?)
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
    }

    /// Resolved base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for `path`; absolute inputs are used unchanged.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest, attempt: Attempt) -> Result<ApiResponse> {
        let url = self.url_for(request.path());
        let method = request.method();

        let mut builder = self.client.request(reqwest_method(method), &url);
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        debug!(
            request_id = %request.id(),
            attempt = attempt.number(),
            %method,
            %url,
            "sending HTTP request"
        );

        let response = builder.send().await.map_err(|err| {
            debug!(request_id = %request.id(), %method, %url, error = %err, "HTTP request failed");
            err.into_session_error(self.timeout)
        })?;

        let status = response.status();
        debug!(
            request_id = %request.id(),
            attempt = attempt.number(),
            %method,
            %url,
            %status,
            "received HTTP response"
        );

        let bytes = response.bytes().await.map_err(|err| err.into_session_error(self.timeout))?;
        let body = decode_body(&bytes);

        if status.is_success() {
            Ok(ApiResponse::new(status.as_u16(), body))
        } else {
            Err(SessionError::from_status(status.as_u16(), error_message(&body)))
        }
    }
}

const fn reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Empty bodies (204/205) become `null`; non-JSON text is kept as a string.
fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// `{"message": "..."}` from an error body, or the raw text.
fn error_message(body: &Value) -> Option<String> {
    match body {
        Value::Object(fields) => fields.get("message").and_then(Value::as_str).map(str::to_string),
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        _ => None,
    }
}

/// Builder for [`HttpTransport`].
#[derive(Debug)]
pub struct HttpTransportBuilder {
    base_url: Option<String>,
    timeout: Duration,
    user_agent: Option<String>,
    default_headers: Option<HeaderMap>,
}

impl Default for HttpTransportBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            default_headers: None,
        }
    }
}

impl HttpTransportBuilder {
    /// API base URL every request path is joined onto.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Per-request timeout, applied to refresh calls and replays alike.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `User-Agent` header sent with every request.
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Headers added to every request.
    #[must_use]
    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    /// Build the transport.
    ///
    /// # Errors
    /// Returns `SessionError::Config` for a missing or malformed base URL, or
    /// if the reqwest client cannot be created.
    pub fn build(self) -> Result<HttpTransport> {
        let base_url = self
            .base_url
            .ok_or_else(|| SessionError::Config("HTTP transport requires a base URL".into()))?;
        Url::parse(&base_url).map_err(|err| SessionError::from(InfraError::from(err)))?;

        // The cookie store carries the session; it is always on.
        let mut builder =
            ReqwestClient::builder().timeout(self.timeout).cookie_store(true).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder
            .build()
            .map_err(|err| SessionError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(HttpTransport {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: self.timeout,
        })
    }
}
