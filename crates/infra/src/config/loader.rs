//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads a `.env` file into the environment, if present
//! 2. Attempts to load from environment variables
//! 3. If `SESSIONRELAY_ENV` is unset, falls back to loading from file
//! 4. Probes multiple paths for config files
//! 5. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `SESSIONRELAY_ENV`: `development` or `production` (required)
//! - `SESSIONRELAY_BASE_URL`: Explicit API base URL
//! - `SESSIONRELAY_ORIGIN`: Site origin for the production `/api` URL
//! - `SESSIONRELAY_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `SESSIONRELAY_USER_AGENT`: User agent sent with every request
//! - `SESSIONRELAY_REFRESH_PATH`: Credential refresh endpoint
//! - `SESSIONRELAY_LOGOUT_PATH`: Server logout endpoint
//! - `SESSIONRELAY_BYPASS_PATHS`: Comma-separated paths whose 401 is not
//!   intercepted
//! - `SESSIONRELAY_LOGOUT_ON_REFRESH_FAILURE`: Call the logout endpoint after
//!   a failed refresh (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./sessionrelay.json` or `./sessionrelay.toml` (current working
//!    directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};

use sessionrelay_domain::{ClientConfig, Environment, Result, SessionError};
use url::Url;

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the required
/// variable is missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `SessionError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The resolved base URL is not a valid http(s) URL
pub fn load() -> Result<ClientConfig> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// `SESSIONRELAY_ENV` must be set; every other variable falls back to the
/// default configuration.
///
/// # Environment Variables
/// See module documentation for the complete list.
///
/// # Errors
/// Returns `SessionError::Config` if the required variable is missing or a
/// variable has an invalid value.
pub fn load_from_env() -> Result<ClientConfig> {
    let environment = env_var("SESSIONRELAY_ENV")?
        .parse::<Environment>()
        .map_err(SessionError::Config)?;

    let defaults = ClientConfig::default();
    let mut refresh = defaults.refresh.clone();

    if let Some(path) = env_opt("SESSIONRELAY_REFRESH_PATH") {
        refresh.refresh_path = path;
    }
    if let Some(path) = env_opt("SESSIONRELAY_LOGOUT_PATH") {
        refresh.logout_path = path;
    }
    if let Some(paths) = env_opt("SESSIONRELAY_BYPASS_PATHS") {
        refresh.bypass_paths = paths
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
    }
    refresh.logout_on_refresh_failure =
        env_bool("SESSIONRELAY_LOGOUT_ON_REFRESH_FAILURE", refresh.logout_on_refresh_failure);

    let timeout_secs = match env_opt("SESSIONRELAY_TIMEOUT_SECS") {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|e| SessionError::Config(format!("Invalid timeout: {e}")))?,
        None => defaults.timeout_secs,
    };

    let config = ClientConfig {
        environment,
        base_url: env_opt("SESSIONRELAY_BASE_URL"),
        origin: env_opt("SESSIONRELAY_ORIGIN"),
        timeout_secs,
        user_agent: env_opt("SESSIONRELAY_USER_AGENT").unwrap_or(defaults.user_agent),
        refresh,
    };

    validate(&config)?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `SessionError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - The resolved base URL is not a valid http(s) URL
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SessionError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SessionError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SessionError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    validate(&config)?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `SessionError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SessionError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SessionError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(SessionError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Check that the configuration resolves to an http(s) base URL.
///
/// # Errors
/// Returns `SessionError::Config` describing the first problem found.
pub fn validate(config: &ClientConfig) -> Result<()> {
    let base_url = config.resolved_base_url()?;
    let parsed = Url::parse(&base_url)
        .map_err(|e| SessionError::Config(format!("Invalid base URL '{base_url}': {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(SessionError::Config(format!(
            "Unsupported base URL scheme '{}'",
            parsed.scheme()
        )));
    }
    if config.timeout_secs == 0 {
        return Err(SessionError::Config("Timeout must be at least one second".into()));
    }
    if !config.refresh.refresh_path.starts_with('/') {
        return Err(SessionError::Config(format!(
            "Refresh path must start with '/': {}",
            config.refresh.refresh_path
        )));
    }
    Ok(())
}

/// Probe multiple paths for configuration files
///
/// Searches for config files in the following locations (in order):
/// 1. Current working directory (`./config.{json,toml}`,
///    `./sessionrelay.{json,toml}`)
/// 2. Parent directories (up to 2 levels)
/// 3. Relative to executable location
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("sessionrelay.json"),
        dir.join("sessionrelay.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

/// Get required environment variable
///
/// # Errors
/// Returns `SessionError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| SessionError::Config(format!("Missing required environment variable: {key}")))
}

/// Optional environment variable; empty values count as unset.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map_or(default, |s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}
