//! Vendor record client abstraction
//!
//! This module defines the capability interface the provider uses to talk to
//! the DNS vendor, so the projection and translation logic can run against any
//! implementation (the Anexia HTTP client in production, an in-memory double
//! in tests).

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

//==============================================================================
// Types
//==============================================================================

/// A DNS zone hosted by the vendor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Zone name, i.e. the domain suffix the zone is authoritative for
    pub name: String,
}

impl Zone {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// A single vendor DNS record (one name, one type, one target)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Vendor assigned identifier, empty for records not yet created
    #[serde(default)]
    pub identifier: String,
    /// Zone the record lives in; not part of the vendor payload
    #[serde(skip)]
    pub zone_name: String,
    /// Name relative to the zone, `""` or `"@"` for the apex
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    /// Time-to-live in seconds, 0 when the zone default applies
    #[serde(default, deserialize_with = "null_as_zero")]
    pub ttl: i64,
    /// Record data (IP address, hostname, TXT content, ...)
    #[serde(default)]
    pub rdata: String,
}

impl Record {
    /// Returns true when the record sits at the zone apex
    pub fn is_apex(&self) -> bool {
        self.name.is_empty() || self.name == "@"
    }

    /// Fully qualified name of the record
    pub fn fqdn(&self) -> String {
        if self.is_apex() {
            self.zone_name.clone()
        } else {
            format!("{}.{}", self.name, self.zone_name)
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} -> {} (zone: {}, TTL: {})",
            self.identifier, self.record_type, self.name, self.rdata, self.zone_name, self.ttl
        )
    }
}

fn null_as_zero<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or_default())
}

//==============================================================================
// Trait
//==============================================================================

/// Record and zone operations against the DNS vendor
///
/// Calls are issued sequentially by the provider; implementations do not need
/// to be re-entrant beyond `Send + Sync`.
#[async_trait]
pub trait DnsService: Send + Sync {
    /// Lists all zones
    async fn get_zones(&self) -> Result<Vec<Zone>>;

    /// Lists the records of every zone
    async fn get_records(&self) -> Result<Vec<Record>>;

    /// Lists the records of `zone` whose relative name equals `name`
    async fn get_records_by_zone_and_name(&self, zone: &str, name: &str) -> Result<Vec<Record>>;

    /// Lists the zones able to host `dns_name`, most specific first
    async fn get_zones_by_domain_name(&self, dns_name: &str) -> Result<Vec<Zone>> {
        let zones = self.get_zones().await?;
        Ok(zones_for_domain(zones, dns_name))
    }

    /// Creates `record` in `zone`
    async fn create_record(&self, zone: &str, record: &Record) -> Result<()>;

    /// Deletes the record identified by `record_id` from `zone`
    async fn delete_record(&self, zone: &str, record_id: &str) -> Result<()>;
}

//==============================================================================
// Zone resolution
//==============================================================================

/// Returns true when `zone` is `dns_name` itself or one of its parent domains
pub fn zone_hosts(zone: &str, dns_name: &str) -> bool {
    let dns_name = dns_name.trim_end_matches('.');
    let zone = zone.trim_end_matches('.');
    if zone.is_empty() {
        return false;
    }
    dns_name.eq_ignore_ascii_case(zone)
        || (dns_name.len() > zone.len()
            && dns_name.as_bytes()[dns_name.len() - zone.len() - 1] == b'.'
            && dns_name[dns_name.len() - zone.len()..].eq_ignore_ascii_case(zone))
}

/// Keeps the zones hosting `dns_name`, sorted by name length, longest first
///
/// The sort is stable, so zones of equal length keep the vendor's order.
pub fn zones_for_domain(zones: Vec<Zone>, dns_name: &str) -> Vec<Zone> {
    let mut matching: Vec<Zone> = zones
        .into_iter()
        .filter(|zone| zone_hosts(&zone.name, dns_name))
        .collect();
    matching.sort_by(|a, b| b.name.len().cmp(&a.name.len()));
    matching
}

/// Name of `dns_name` relative to `zone`; the apex maps to `"@"`
pub fn relative_name(dns_name: &str, zone: &str) -> String {
    let dns_name = dns_name.trim_end_matches('.');
    let zone = zone.trim_end_matches('.');
    if dns_name.eq_ignore_ascii_case(zone) {
        return "@".to_string();
    }
    match dns_name.len().checked_sub(zone.len() + 1) {
        Some(cut) if zone_hosts(zone, dns_name) => dns_name[..cut].to_string(),
        _ => dns_name.to_string(),
    }
}

//==============================================================================
// Tests
//==============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn zones(names: &[&str]) -> Vec<Zone> {
        names.iter().map(|n| Zone::new(n)).collect()
    }

    #[test]
    fn test_record_fqdn() {
        let mut record = Record {
            identifier: "1".to_string(),
            zone_name: "a.de".to_string(),
            name: "www".to_string(),
            record_type: "A".to_string(),
            ttl: 300,
            rdata: "1.2.3.4".to_string(),
        };
        assert_eq!(record.fqdn(), "www.a.de");

        record.name = "@".to_string();
        assert_eq!(record.fqdn(), "a.de");

        record.name = String::new();
        assert_eq!(record.fqdn(), "a.de");
    }

    #[test]
    fn test_record_parsing() {
        let json = r#"{
            "identifier": "e4f1a0a3a1b94a3f9d4c6c6f7c3c2b1a",
            "immutable": false,
            "name": "www",
            "rdata": "1.2.3.4",
            "region": "",
            "ttl": null,
            "type": "A"
        }"#;

        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.identifier, "e4f1a0a3a1b94a3f9d4c6c6f7c3c2b1a");
        assert_eq!(record.record_type, "A");
        assert_eq!(record.ttl, 0);
        assert!(record.zone_name.is_empty());
    }

    #[test]
    fn test_zone_hosts_on_label_boundary() {
        assert!(zone_hosts("de", "a.de"));
        assert!(zone_hosts("a.de", "a.de"));
        assert!(zone_hosts("a.de", "www.a.de."));
        assert!(!zone_hosts("de", "bade"));
        assert!(!zone_hosts("b.de", "a.de"));
        assert!(!zone_hosts("", "a.de"));
    }

    #[test]
    fn test_zones_for_domain_most_specific_first() {
        let result = zones_for_domain(zones(&["de", "com", "a.de", "x.a.de"]), "www.a.de");
        let names: Vec<&str> = result.iter().map(|z| z.name.as_str()).collect();
        assert_eq!(names, vec!["a.de", "de"]);
    }

    #[test]
    fn test_zones_for_domain_no_match() {
        assert!(zones_for_domain(zones(&["com", "org"]), "a.de").is_empty());
    }

    #[test]
    fn test_relative_name() {
        assert_eq!(relative_name("a.de", "de"), "a");
        assert_eq!(relative_name("www.a.de", "de"), "www.a");
        assert_eq!(relative_name("www.a.de.", "a.de"), "www");
        assert_eq!(relative_name("a.de", "a.de"), "@");
        assert_eq!(relative_name("a.com", "de"), "a.com");
    }
}
