//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants::{
    API_PREFIX, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, DEVELOPMENT_BASE_URL, LOGIN_PATH,
    LOGOUT_PATH, REFRESH_PATH, SIGNUP_PATH,
};
use crate::errors::{Result, SessionError};
use crate::impl_wire_name_conversions;

/// Deployment environment, selects the default base URL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Local backend at `localhost:5000`
    #[default]
    Development,
    /// Same-origin backend under `/api`
    Production,
}

impl_wire_name_conversions!(Environment {
    Development => "development",
    Production => "production",
});

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Selects the base URL when none is given
    pub environment: Environment,
    /// Explicit base URL; wins over environment resolution
    pub base_url: Option<String>,
    /// Site origin used to build the production `/api` base URL
    pub origin: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// `User-Agent` header value
    pub user_agent: String,
    /// Refresh and interception settings
    pub refresh: RefreshConfig,
}

/// Refresh and interception settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Endpoint that renews the session
    pub refresh_path: String,
    /// Endpoint that drops the server session
    pub logout_path: String,
    /// Paths whose 401 means "bad credentials" rather than "expired session"
    pub bypass_paths: Vec<String>,
    /// Tell the server to drop the session after a failed refresh
    pub logout_on_refresh_failure: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            refresh_path: REFRESH_PATH.to_string(),
            logout_path: LOGOUT_PATH.to_string(),
            bypass_paths: vec![LOGIN_PATH.to_string(), SIGNUP_PATH.to_string()],
            logout_on_refresh_failure: true,
        }
    }
}

impl RefreshConfig {
    /// Whether a 401 on `path` should go through refresh-and-replay.
    ///
    /// The refresh endpoint itself is never intercepted.
    pub fn intercepts(&self, path: &str) -> bool {
        let path = path.split('?').next().unwrap_or(path);
        path != self.refresh_path && !self.bypass_paths.iter().any(|p| p == path)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            base_url: None,
            origin: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            refresh: RefreshConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Configuration pointing at an explicit base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { base_url: Some(base_url.into()), ..Self::default() }
    }

    /// Resolve the API base URL (no trailing slash).
    ///
    /// # Errors
    /// Returns `SessionError::Config` for production without an origin.
    pub fn resolved_base_url(&self) -> Result<String> {
        let url = match (&self.base_url, self.environment) {
            (Some(url), _) => url.clone(),
            (None, Environment::Development) => DEVELOPMENT_BASE_URL.to_string(),
            (None, Environment::Production) => {
                let origin = self.origin.as_deref().ok_or_else(|| {
                    SessionError::Config(
                        "production environment requires an origin or explicit base_url".into(),
                    )
                })?;
                format!("{}{}", origin.trim_end_matches('/'), API_PREFIX)
            }
        };
        Ok(url.trim_end_matches('/').to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_uses_local_server() {
        let config = ClientConfig::default();
        assert_eq!(config.resolved_base_url().unwrap(), "http://localhost:5000/api");
    }

    #[test]
    fn production_appends_api_prefix_to_origin() {
        let config = ClientConfig {
            environment: Environment::Production,
            origin: Some("https://shop.example.com/".into()),
            ..ClientConfig::default()
        };
        assert_eq!(config.resolved_base_url().unwrap(), "https://shop.example.com/api");
    }

    #[test]
    fn production_without_origin_is_config_error() {
        let config = ClientConfig { environment: Environment::Production, ..Default::default() };
        assert!(matches!(config.resolved_base_url(), Err(SessionError::Config(_))));
    }

    #[test]
    fn explicit_base_url_wins() {
        let config = ClientConfig {
            environment: Environment::Production,
            ..ClientConfig::with_base_url("http://127.0.0.1:9000/api/")
        };
        assert_eq!(config.resolved_base_url().unwrap(), "http://127.0.0.1:9000/api");
    }

    #[test]
    fn refresh_and_credential_paths_are_not_intercepted() {
        let refresh = RefreshConfig::default();
        assert!(!refresh.intercepts("/auth/refreshToken"));
        assert!(!refresh.intercepts("/auth/login"));
        assert!(!refresh.intercepts("/auth/signup?invite=1"));
        assert!(refresh.intercepts("/auth/profile"));
        assert!(refresh.intercepts("/cart"));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{ "environment": "production" }"#)
            .unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.refresh.refresh_path, "/auth/refreshToken");
        assert_eq!(config.timeout_secs, 30);
    }
}
