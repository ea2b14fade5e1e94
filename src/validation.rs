//! Validation utilities for anexia-webhook
//!
//! This module validates configuration inputs: domain filter entries and the
//! Anexia API base URL.

use anyhow::{anyhow, Result};
use reqwest::Url;

use crate::constants::{MAX_DOMAIN_NAME_LENGTH, MAX_LABEL_LENGTH};

/// Validates a domain filter entry
///
/// Entries are domain suffixes as external-dns accepts them for
/// `--domain-filter` and `--exclude-domains`.
///
/// # Validation Rules
///
/// 1. **Length constraints**:
///    - Maximum total length: 253 characters (excluding leading/trailing dot)
///    - Maximum label length: 63 characters
///
/// 2. **Syntax rules**:
///    - A single leading dot (`.example.com`, subdomains only) is allowed
///    - A trailing dot (FQDN notation) is allowed and ignored
///    - Labels cannot be empty, contain spaces or start/end with hyphens
///
/// 3. **Allowed characters**: letters, digits, `-` and `_`
///
/// # Examples
///
/// ```
/// use anexia_webhook::validation::validate_domain_name;
///
/// assert!(validate_domain_name("example.com").is_ok());
/// assert!(validate_domain_name(".example.com").is_ok());
/// assert!(validate_domain_name("example.com.").is_ok());
///
/// assert!(validate_domain_name("").is_err());
/// assert!(validate_domain_name("example..com").is_err());
/// assert!(validate_domain_name("*.example.com").is_err());
/// ```
pub fn validate_domain_name(domain: &str) -> Result<()> {
    let trimmed = domain.trim();
    if trimmed.contains(' ') {
        return Err(anyhow!("Domain '{}' cannot contain spaces", domain));
    }

    let name = trimmed.strip_prefix('.').unwrap_or(trimmed);
    let name = name.strip_suffix('.').unwrap_or(name);
    if name.is_empty() {
        return Err(anyhow!("Domain cannot be empty"));
    }
    if name.len() > MAX_DOMAIN_NAME_LENGTH {
        return Err(anyhow!(
            "Domain too long (max {} characters, got {})",
            MAX_DOMAIN_NAME_LENGTH,
            name.len()
        ));
    }

    for label in name.split('.') {
        if label.is_empty() {
            return Err(anyhow!("Domain '{}' contains empty label", domain));
        }
        if label.len() > MAX_LABEL_LENGTH {
            return Err(anyhow!(
                "Domain label too long (max {} characters, got {})",
                MAX_LABEL_LENGTH,
                label.len()
            ));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(anyhow!(
                "Domain '{}' label cannot start or end with hyphen",
                domain
            ));
        }
        if let Some(ch) = label
            .chars()
            .find(|ch| !ch.is_alphanumeric() && *ch != '-' && *ch != '_')
        {
            return Err(anyhow!(
                "Domain '{}' contains invalid character: '{}'",
                domain,
                ch
            ));
        }
    }

    Ok(())
}

/// Validates the Anexia API base URL override
///
/// The URL must be absolute, use `http` or `https` and carry no query.
pub fn validate_api_url(url: &str) -> Result<()> {
    let parsed = Url::parse(url).map_err(|e| anyhow!("Invalid API URL '{}': {}", url, e))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(anyhow!(
                "API URL must use http or https, got scheme '{}'",
                other
            ))
        }
    }
    if parsed.host_str().is_none() {
        return Err(anyhow!("API URL '{}' has no host", url));
    }
    if parsed.query().is_some() {
        return Err(anyhow!("API URL '{}' must not contain a query", url));
    }
    Ok(())
}
