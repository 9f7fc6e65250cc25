//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files and
//! wiring a client from it.

use std::io::Write;
use std::path::PathBuf;

use sessionrelay_domain::{Environment, SessionError};
use sessionrelay_infra::{config, connect};
use tempfile::NamedTempFile;

fn write_config(contents: &str, extension: &str) -> PathBuf {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(contents.as_bytes()).expect("Failed to write to temp file");

    let path = temp_file.path().with_extension(extension);
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");
    path
}

#[test]
fn test_load_config_from_json_file() {
    let path = write_config(
        r#"{
            "environment": "production",
            "origin": "https://shop.example.com",
            "timeout_secs": 15,
            "user_agent": "storefront/2.1",
            "refresh": {
                "refresh_path": "/auth/refreshToken",
                "logout_path": "/auth/logout",
                "bypass_paths": ["/auth/login", "/auth/signup"],
                "logout_on_refresh_failure": true
            }
        }"#,
        "json",
    );

    let config = config::load_from_file(Some(path.clone())).expect("Failed to load JSON config");

    assert_eq!(config.environment, Environment::Production);
    assert_eq!(config.resolved_base_url().unwrap(), "https://shop.example.com/api");
    assert_eq!(config.timeout_secs, 15);
    assert_eq!(config.user_agent, "storefront/2.1");
    assert!(config.refresh.intercepts("/cart"));
    assert!(!config.refresh.intercepts("/auth/login"));

    // Cleanup
    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_config_from_toml_file() {
    let path = write_config(
        r#"
environment = "development"
timeout_secs = 5

[refresh]
logout_on_refresh_failure = false
"#,
        "toml",
    );

    let config = config::load_from_file(Some(path.clone())).expect("Failed to load TOML config");

    assert_eq!(config.environment, Environment::Development);
    assert_eq!(config.resolved_base_url().unwrap(), "http://localhost:5000/api");
    assert!(!config.refresh.logout_on_refresh_failure);

    // Cleanup
    std::fs::remove_file(path).ok();
}

#[test]
fn test_loaded_config_builds_a_client() {
    let path = write_config(r#"{ "base_url": "http://127.0.0.1:5000/api/" }"#, "json");

    let config = config::load_from_file(Some(path.clone())).expect("Failed to load config");
    let client = connect(&config).expect("client from config");

    assert!(!client.session().authenticated);
    assert_eq!(client.coordinator().config().refresh_path, "/auth/refreshToken");

    // Cleanup
    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_config_from_nonexistent_file() {
    let result = config::load_from_file(Some("/nonexistent/path/config.json".into()));

    match result {
        Err(SessionError::Config(msg)) => {
            assert!(msg.contains("not found"), "Error message should mention 'not found'");
        }
        other => panic!("Expected Config error, got {other:?}"),
    }
}

#[test]
fn test_load_config_with_invalid_format() {
    let path = write_config(r#"{ "this is": "not valid" "#, "json");

    match config::load_from_file(Some(path.clone())) {
        Err(SessionError::Config(msg)) => {
            assert!(msg.contains("Invalid JSON"), "Error message should mention invalid JSON");
        }
        other => panic!("Expected Config error, got {other:?}"),
    }

    // Cleanup
    std::fs::remove_file(path).ok();
}

#[test]
fn test_production_config_without_origin_is_rejected() {
    let path = write_config(r#"{ "environment": "production" }"#, "json");

    let result = config::load_from_file(Some(path.clone()));
    assert!(matches!(result, Err(SessionError::Config(_))));

    // Cleanup
    std::fs::remove_file(path).ok();
}
