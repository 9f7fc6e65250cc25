//! Endpoint and configuration constants
//!
//! Paths are relative to the resolved API base URL.

// Authentication endpoints
/// Renews the access cookie from the refresh cookie
pub const REFRESH_PATH: &str = "/auth/refreshToken";
/// Email and password login
pub const LOGIN_PATH: &str = "/auth/login";
/// Account creation
pub const SIGNUP_PATH: &str = "/auth/signup";
/// Drops both session cookies on the server
pub const LOGOUT_PATH: &str = "/auth/logout";
/// Current user, if the session is valid
pub const PROFILE_PATH: &str = "/auth/profile";

// Base URL resolution
/// Base URL used outside production
pub const DEVELOPMENT_BASE_URL: &str = "http://localhost:5000/api";
/// Appended to the production origin
pub const API_PREFIX: &str = "/api";

// Transport defaults
/// Per-request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// `User-Agent` sent when none is configured
pub const DEFAULT_USER_AGENT: &str = concat!("sessionrelay/", env!("CARGO_PKG_VERSION"));
