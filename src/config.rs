//! Configuration module for anexia-webhook
//!
//! This module handles loading and validating configuration from files and environment variables.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context as _, Result};
use regex::Regex;
use zeroize::ZeroizeOnDrop;

use crate::constants::{
    DEFAULT_HEALTH_PORT, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, DEFAULT_TIMEOUT_SECS,
    ENV_API_TIMEOUT, ENV_API_TOKEN, ENV_API_URL, ENV_DOMAIN_FILTER, ENV_DRY_RUN,
    ENV_EXCLUDE_DOMAINS, ENV_HEALTH_PORT, ENV_LOG_FORMAT, ENV_LOG_LEVEL,
    ENV_REGEX_DOMAIN_EXCLUSION, ENV_REGEX_DOMAIN_FILTER, ENV_SERVER_HOST, ENV_SERVER_PORT,
    MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS,
};
use crate::domain_filter::DomainFilter;
use crate::validation::{validate_api_url, validate_domain_name};

//==============================================================================
// Config
//==============================================================================

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Configuration for the webhook provider
///
/// # Configuration Loading Priority
///
/// Configuration is loaded from multiple sources in order of precedence:
/// 1. Environment variables (highest priority)
/// 2. Config file (passed with `--config`)
/// 3. Defaults (lowest priority)
///
/// The API token is wrapped in `Zeroizing` so it is cleared from memory when
/// dropped.
#[derive(Clone, ZeroizeOnDrop)]
pub struct Config {
    /// Anexia API token, `ANEXIA_API_TOKEN`
    #[zeroize(skip)]
    pub api_token: zeroize::Zeroizing<String>,
    /// Anexia API base URL override, `ANEXIA_API_URL`
    #[zeroize(skip)]
    pub api_url: Option<String>,
    /// Simulate mutating calls, `DRY_RUN`
    #[zeroize(skip)]
    pub dry_run: bool,
    /// HTTP request timeout for vendor calls
    ///
    /// Default: 30 seconds
    #[zeroize(skip)]
    pub timeout: Duration,
    /// Included domains, `DOMAIN_FILTER` (comma separated)
    #[zeroize(skip)]
    pub domain_filter: Vec<String>,
    /// Excluded domains, `EXCLUDE_DOMAIN_FILTER` (comma separated)
    #[zeroize(skip)]
    pub exclude_domains: Vec<String>,
    /// Include regex, `REGEXP_DOMAIN_FILTER`; takes precedence over the lists
    #[zeroize(skip)]
    pub regex_domain_filter: String,
    /// Exclude regex, `REGEXP_DOMAIN_FILTER_EXCLUSION`
    #[zeroize(skip)]
    pub regex_domain_exclusion: String,
    /// Webhook bind host
    ///
    /// Default: "localhost"; external-dns runs as a sidecar
    #[zeroize(skip)]
    pub server_host: String,
    /// Webhook port
    ///
    /// Default: 8888
    #[zeroize(skip)]
    pub server_port: u16,
    /// Port for health check and metrics endpoint
    ///
    /// Default: 8080
    /// Set to 0 to disable the health check endpoint.
    #[zeroize(skip)]
    pub health_port: u16,
    /// Log level used when `RUST_LOG` is not set
    #[zeroize(skip)]
    pub log_level: String,
    #[zeroize(skip)]
    pub log_format: LogFormat,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_token", &"***REDACTED***")
            .field("api_url", &self.api_url)
            .field("dry_run", &self.dry_run)
            .field("timeout", &self.timeout)
            .field("domain_filter", &self.domain_filter)
            .field("exclude_domains", &self.exclude_domains)
            .field("regex_domain_filter", &self.regex_domain_filter)
            .field("regex_domain_exclusion", &self.regex_domain_exclusion)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("health_port", &self.health_port)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Config {
    /// Loads configuration from file and environment variables
    ///
    /// This method loads configuration in the following order:
    /// 1. Loads from the specified config file (if provided and exists)
    /// 2. Overrides with environment variables (if set)
    /// 3. Validates the final configuration
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::load_from_file(config_path)?;
        Self::override_with_env(&mut config)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Loads configuration from a TOML file, falling back to defaults
    fn load_from_file(config_path: Option<PathBuf>) -> Result<Self> {
        let mut file = TomlConfig::default();

        if let Some(path) = config_path {
            if path.exists() {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config: {}", path.display()))?;
                file = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
            }
        }

        let log_format = match file.log_format.as_deref() {
            Some(v) => parse_log_format(v)?,
            None => LogFormat::default(),
        };

        Ok(Self {
            api_token: zeroize::Zeroizing::new(file.api_token.unwrap_or_default()),
            api_url: file.api_url.filter(|url| !url.is_empty()),
            dry_run: file.dry_run.unwrap_or(false),
            timeout: Duration::from_secs(file.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            domain_filter: file.domain_filter.unwrap_or_default(),
            exclude_domains: file.exclude_domains.unwrap_or_default(),
            regex_domain_filter: file.regex_domain_filter.unwrap_or_default(),
            regex_domain_exclusion: file.regex_domain_exclusion.unwrap_or_default(),
            server_host: file
                .server_host
                .unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
            server_port: file.server_port.unwrap_or(DEFAULT_SERVER_PORT),
            health_port: file.health_port.unwrap_or(DEFAULT_HEALTH_PORT),
            log_level: file.log_level.unwrap_or_else(|| "info".to_string()),
            log_format,
        })
    }

    /// Overrides configuration values with environment variables
    ///
    /// Only variables that are set and non-empty are applied.
    fn override_with_env(config: &mut Self) -> Result<()> {
        if let Some(v) = non_empty_env(ENV_API_TOKEN) {
            config.api_token = zeroize::Zeroizing::new(v);
        }
        if let Some(v) = non_empty_env(ENV_API_URL) {
            config.api_url = Some(v);
        }
        if let Some(v) = non_empty_env(ENV_DRY_RUN) {
            config.dry_run = parse_bool_env(&v).context("Invalid DRY_RUN value")?;
        }
        if let Some(v) = non_empty_env(ENV_API_TIMEOUT) {
            let secs: u64 = v.trim().parse().context("Invalid ANEXIA_API_TIMEOUT value")?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(v) = non_empty_env(ENV_DOMAIN_FILTER) {
            config.domain_filter = parse_list(&v);
        }
        if let Some(v) = non_empty_env(ENV_EXCLUDE_DOMAINS) {
            config.exclude_domains = parse_list(&v);
        }
        if let Some(v) = non_empty_env(ENV_REGEX_DOMAIN_FILTER) {
            config.regex_domain_filter = v;
        }
        if let Some(v) = non_empty_env(ENV_REGEX_DOMAIN_EXCLUSION) {
            config.regex_domain_exclusion = v;
        }
        if let Some(v) = non_empty_env(ENV_SERVER_HOST) {
            config.server_host = v;
        }
        if let Some(v) = non_empty_env(ENV_SERVER_PORT) {
            config.server_port = v.trim().parse().context("Invalid SERVER_PORT value")?;
        }
        if let Some(v) = non_empty_env(ENV_HEALTH_PORT) {
            config.health_port = v.trim().parse().context("Invalid HEALTH_PORT value")?;
        }
        if let Some(v) = non_empty_env(ENV_LOG_LEVEL) {
            config.log_level = v;
        }
        if let Some(v) = non_empty_env(ENV_LOG_FORMAT) {
            config.log_format = parse_log_format(&v)?;
        }
        Ok(())
    }

    /// Validates the configuration
    ///
    /// Returns an error if:
    /// - API token is missing
    /// - API URL is not an absolute http(s) URL
    /// - Timeout is out of valid range
    /// - A domain filter entry or regex is malformed
    /// - The webhook port is 0
    /// - The log level is unknown
    fn validate(&self) -> Result<()> {
        if self.api_token.as_str().trim().is_empty() {
            return Err(anyhow::anyhow!("Missing {}", ENV_API_TOKEN));
        }
        if let Some(url) = &self.api_url {
            validate_api_url(url).with_context(|| format!("Invalid {}", ENV_API_URL))?;
        }

        let timeout_secs = self.timeout.as_secs();
        if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&timeout_secs) {
            return Err(anyhow::anyhow!(
                "timeout must be between {} and {} seconds, got {}",
                MIN_TIMEOUT_SECS,
                MAX_TIMEOUT_SECS,
                timeout_secs
            ));
        }

        for domain in &self.domain_filter {
            validate_domain_name(domain).with_context(|| format!("Invalid {}", ENV_DOMAIN_FILTER))?;
        }
        for domain in &self.exclude_domains {
            validate_domain_name(domain)
                .with_context(|| format!("Invalid {}", ENV_EXCLUDE_DOMAINS))?;
        }
        self.domain_filter()?;

        if self.server_port == 0 {
            return Err(anyhow::anyhow!("{} must not be 0", ENV_SERVER_PORT));
        }
        self.log_level
            .trim()
            .parse::<tracing::Level>()
            .map_err(|_| anyhow::anyhow!("Invalid {} value: {}", ENV_LOG_LEVEL, self.log_level))?;

        Ok(())
    }

    /// Builds the domain filter
    ///
    /// A non-empty include regex selects the regex filter; otherwise the
    /// include/exclude lists are used.
    pub fn domain_filter(&self) -> Result<DomainFilter> {
        if self.regex_domain_filter.is_empty() {
            return Ok(DomainFilter::new(&self.domain_filter, &self.exclude_domains));
        }

        let include = Regex::new(&self.regex_domain_filter)
            .with_context(|| format!("Invalid {}", ENV_REGEX_DOMAIN_FILTER))?;
        let exclude = if self.regex_domain_exclusion.is_empty() {
            None
        } else {
            Some(
                Regex::new(&self.regex_domain_exclusion)
                    .with_context(|| format!("Invalid {}", ENV_REGEX_DOMAIN_EXCLUSION))?,
            )
        };
        Ok(DomainFilter::with_regex(include, exclude))
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

/// Splits a comma separated list, dropping blank entries
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses a boolean value from an environment variable
///
/// This function accepts multiple string representations of boolean values:
/// - `true`: "1", "true", "yes", "on"
/// - `false`: "0", "false", "no", "off"
fn parse_bool_env(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow::anyhow!(
            "expected boolean (true/false/1/0/yes/no/on/off)"
        )),
    }
}

/// Parses a log format ("text" or "json")
pub fn parse_log_format(value: &str) -> Result<LogFormat> {
    match value.trim().to_ascii_lowercase().as_str() {
        "text" | "plain" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        _ => Err(anyhow::anyhow!(
            "Invalid log format: '{}'. Use: text|json",
            value
        )),
    }
}

/// TOML configuration file structure
#[derive(Debug, Default, serde::Deserialize)]
struct TomlConfig {
    api_token: Option<String>,
    api_url: Option<String>,
    dry_run: Option<bool>,
    timeout: Option<u64>,
    domain_filter: Option<Vec<String>>,
    exclude_domains: Option<Vec<String>>,
    regex_domain_filter: Option<String>,
    regex_domain_exclusion: Option<String>,
    server_host: Option<String>,
    server_port: Option<u16>,
    health_port: Option<u16>,
    log_level: Option<String>,
    log_format: Option<String>,
}

//==============================================================================
// Tests
//==============================================================================
