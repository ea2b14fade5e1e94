//! Integration tests for configuration loading

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anexia_webhook::config::{Config, LogFormat};
use serial_test::serial;
use tempfile::TempDir;

const ENV_KEYS: &[&str] = &[
    "ANEXIA_API_TOKEN",
    "ANEXIA_API_URL",
    "ANEXIA_API_TIMEOUT",
    "DRY_RUN",
    "DOMAIN_FILTER",
    "EXCLUDE_DOMAIN_FILTER",
    "REGEXP_DOMAIN_FILTER",
    "REGEXP_DOMAIN_FILTER_EXCLUSION",
    "SERVER_HOST",
    "SERVER_PORT",
    "HEALTH_PORT",
    "LOG_LEVEL",
    "LOG_FORMAT",
];

/// Helper function to create a temporary config file with given content
fn create_temp_config(content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = dir.path().join("anexia-webhook.toml");
    fs::write(&config_path, content).expect("Failed to write temp config");
    (dir, config_path)
}

/// Helper function to clear environment variables for testing
fn clear_env_vars() {
    for key in ENV_KEYS {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_config_load_from_env_vars() {
    clear_env_vars();
    env::set_var("ANEXIA_API_TOKEN", "test_token");
    env::set_var("ANEXIA_API_URL", "http://localhost:9000");
    env::set_var("DOMAIN_FILTER", "example.com,example.org");
    env::set_var("EXCLUDE_DOMAIN_FILTER", "internal.example.com");
    env::set_var("LOG_FORMAT", "json");

    let config = Config::load(None).expect("Failed to load config from env vars");
    assert_eq!(config.api_token.as_str(), "test_token");
    assert_eq!(config.api_url.as_deref(), Some("http://localhost:9000"));
    assert_eq!(config.log_format, LogFormat::Json);

    let filter = config.domain_filter().unwrap();
    assert!(filter.is_configured());
    assert!(filter.matches("www.example.org"));
    assert!(!filter.matches("db.internal.example.com"));
    assert!(!filter.matches("example.net"));

    clear_env_vars();
}

#[test]
#[serial]
fn test_config_load_from_file_with_regex() {
    clear_env_vars();
    let (_dir, config_path) = create_temp_config(
        r#"
api_token = "file_token"
timeout = 10
domain_filter = ["ignored.com"]
regex_domain_filter = '(^|\.)example\.com$'
regex_domain_exclusion = '^staging\.'
"#,
    );

    let config = Config::load(Some(config_path)).expect("Failed to load config from file");
    assert_eq!(config.timeout, Duration::from_secs(10));

    let filter = config.domain_filter().unwrap();
    assert!(filter.matches("example.com"));
    assert!(filter.matches("www.example.com"));
    assert!(!filter.matches("staging.example.com"));
    assert!(!filter.matches("ignored.com"));

    let json = serde_json::to_value(&filter).unwrap();
    assert_eq!(json["regexInclude"], r"(^|\.)example\.com$");
    assert_eq!(json["regexExclude"], r"^staging\.");
}

#[test]
#[serial]
fn test_config_env_overrides_file() {
    clear_env_vars();
    let (_dir, config_path) = create_temp_config(
        r#"
api_token = "file_token"
server_port = 9000
health_port = 9001
"#,
    );
    env::set_var("ANEXIA_API_TOKEN", "env_token");
    env::set_var("HEALTH_PORT", "0");

    let config = Config::load(Some(config_path)).expect("Failed to load config");
    assert_eq!(config.api_token.as_str(), "env_token");
    assert_eq!(config.server_port, 9000);
    assert_eq!(config.health_port, 0);

    clear_env_vars();
}

#[test]
#[serial]
fn test_config_empty_env_values_are_ignored() {
    clear_env_vars();
    let (_dir, config_path) = create_temp_config(r#"api_token = "file_token""#);
    env::set_var("ANEXIA_API_TOKEN", "");
    env::set_var("SERVER_HOST", "");

    let config = Config::load(Some(config_path)).expect("Failed to load config");
    assert_eq!(config.api_token.as_str(), "file_token");
    assert_eq!(config.server_host, "localhost");

    clear_env_vars();
}

#[test]
#[serial]
fn test_config_unknown_file_key_is_ignored() {
    clear_env_vars();
    let (_dir, config_path) = create_temp_config(
        r#"
api_token = "file_token"
unknown_key = "value"
"#,
    );

    assert!(Config::load(Some(config_path)).is_ok());
}

#[test]
#[serial]
fn test_config_wrong_type_in_file() {
    clear_env_vars();
    let (_dir, config_path) = create_temp_config(
        r#"
api_token = "file_token"
server_port = "not-a-port"
"#,
    );

    assert!(Config::load(Some(config_path)).is_err());
}
