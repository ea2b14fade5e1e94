//! external-dns endpoint model
//!
//! These types mirror the JSON the external-dns webhook protocol exchanges:
//! endpoints describe one DNS name + record type + TTL + target set, and a
//! changeset bundles the creates, deletes and update pairs computed by the
//! host's planner.

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use anyhow::{bail, Result};
use serde::{Deserialize, Deserializer, Serialize};

//==============================================================================
// Targets
//==============================================================================

/// Ordered list of record targets (IP addresses, hostnames, TXT data, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Targets(pub Vec<String>);

impl Targets {
    pub fn new<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(targets.into_iter().map(Into::into).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn contains(&self, target: &str) -> bool {
        self.0.iter().any(|t| t == target)
    }

    /// Multiset equality: same length and same members regardless of order.
    ///
    /// IP addresses compare by value (`2001:db8::1` equals
    /// `2001:0db8:0:0:0:0:0:1`); anything else compares ASCII
    /// case-insensitively, as hostnames do.
    pub fn same(&self, other: &Targets) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mut left: Vec<String> = self.0.iter().map(|t| canonical_target(t)).collect();
        let mut right: Vec<String> = other.0.iter().map(|t| canonical_target(t)).collect();
        left.sort();
        right.sort();
        left == right
    }
}

impl fmt::Display for Targets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(";"))
    }
}

impl<'a> IntoIterator for &'a Targets {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

//==============================================================================
// Endpoint
//==============================================================================

/// Provider specific key/value attached to an endpoint by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpecificProperty {
    pub name: String,
    pub value: String,
}

/// Canonical DNS endpoint exchanged with external-dns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Fully qualified DNS name
    pub dns_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub targets: Targets,
    pub record_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub set_identifier: String,
    /// TTL in seconds, 0 means "not configured"
    #[serde(rename = "recordTTL", default, skip_serializing_if = "is_zero")]
    pub record_ttl: i64,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub labels: BTreeMap<String, String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub provider_specific: Vec<ProviderSpecificProperty>,
}

impl Endpoint {
    pub fn new(dns_name: &str, record_type: &str, record_ttl: i64, targets: Targets) -> Self {
        Self {
            dns_name: dns_name.to_string(),
            targets,
            record_type: record_type.to_string(),
            record_ttl,
            ..Default::default()
        }
    }

    /// Returns true when name, type, TTL or target set differ.
    ///
    /// Labels and provider specific properties are not compared; the vendor
    /// has nowhere to store them.
    pub fn differs_from(&self, other: &Endpoint) -> bool {
        self.dns_name != other.dns_name
            || self.record_type != other.record_type
            || self.record_ttl != other.record_ttl
            || !self.targets.same(&other.targets)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} IN {} {}",
            self.dns_name, self.record_ttl, self.record_type, self.targets
        )
    }
}

//==============================================================================
// Changes
//==============================================================================

/// Changeset computed by the external-dns planner
///
/// `update_old[i]` and `update_new[i]` describe one logical update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Changes {
    #[serde(default, deserialize_with = "null_as_default")]
    pub create: Vec<Endpoint>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub update_old: Vec<Endpoint>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub update_new: Vec<Endpoint>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub delete: Vec<Endpoint>,
}

impl Changes {
    /// Checks that every `update_old` entry has its `update_new` counterpart
    pub fn check_updates(&self) -> Result<()> {
        if self.update_old.len() != self.update_new.len() {
            bail!(
                "UpdateOld and UpdateNew differ in length ({} vs {})",
                self.update_old.len(),
                self.update_new.len()
            );
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.create.is_empty()
            && self.update_old.is_empty()
            && self.update_new.is_empty()
            && self.delete.is_empty()
    }
}

//==============================================================================
// Helpers
//==============================================================================

fn canonical_target(target: &str) -> String {
    match target.parse::<IpAddr>() {
        Ok(ip) => ip.to_string(),
        Err(_) => target.to_ascii_lowercase(),
    }
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// Go encodes nil slices and maps as `null`
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

//==============================================================================
// Tests
//==============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(name: &str, ttl: i64, targets: &[&str]) -> Endpoint {
        Endpoint::new(name, "A", ttl, Targets::new(targets.iter().copied()))
    }

    #[test]
    fn test_targets_same_ignores_order() {
        let a = Targets::new(["1.2.3.4", "5.6.7.8"]);
        let b = Targets::new(["5.6.7.8", "1.2.3.4"]);
        assert!(a.same(&b));
    }

    #[test]
    fn test_targets_same_respects_multiplicity() {
        let a = Targets::new(["1.2.3.4", "1.2.3.4"]);
        let b = Targets::new(["1.2.3.4", "5.6.7.8"]);
        assert!(!a.same(&b));
        assert!(!a.same(&Targets::new(["1.2.3.4"])));
    }

    #[test]
    fn test_targets_same_is_case_insensitive() {
        let a = Targets::new(["Target.Example.com"]);
        let b = Targets::new(["target.example.com"]);
        assert!(a.same(&b));
    }

    #[test]
    fn test_targets_same_compares_addresses_by_value() {
        let a = Targets::new(["2001:db8::1", "192.0.2.1"]);
        let b = Targets::new(["192.0.2.1", "2001:0DB8:0:0:0:0:0:1"]);
        assert!(a.same(&b));
        assert!(!a.same(&Targets::new(["2001:db8::2", "192.0.2.1"])));
    }

    #[test]
    fn test_update_with_rewritten_address_is_not_a_change() {
        let old = Endpoint::new("a.de", "AAAA", 300, Targets::new(["2001:db8::1"]));
        let new = Endpoint::new("a.de", "AAAA", 300, Targets::new(["2001:0db8:0:0:0:0:0:1"]));
        assert!(!old.differs_from(&new));
    }

    #[test]
    fn test_check_updates() {
        let ep = endpoint("a.de", 300, &["1.2.3.4"]);
        let paired = Changes {
            update_old: vec![ep.clone()],
            update_new: vec![ep.clone()],
            ..Default::default()
        };
        assert!(paired.check_updates().is_ok());

        let unpaired = Changes {
            update_old: vec![ep],
            ..Default::default()
        };
        let err = unpaired.check_updates().unwrap_err();
        assert_eq!(err.to_string(), "UpdateOld and UpdateNew differ in length (1 vs 0)");
    }

    #[test]
    fn test_endpoint_differs_from() {
        let base = endpoint("a.de", 300, &["1.2.3.4", "5.6.7.8"]);
        assert!(!base.differs_from(&endpoint("a.de", 300, &["5.6.7.8", "1.2.3.4"])));
        assert!(base.differs_from(&endpoint("b.de", 300, &["1.2.3.4", "5.6.7.8"])));
        assert!(base.differs_from(&endpoint("a.de", 600, &["1.2.3.4", "5.6.7.8"])));
        assert!(base.differs_from(&endpoint("a.de", 300, &["1.2.3.4"])));

        let mut other_type = base.clone();
        other_type.record_type = "AAAA".to_string();
        assert!(base.differs_from(&other_type));
    }

    #[test]
    fn test_endpoint_json_shape() {
        let ep = endpoint("a.de", 300, &["1.2.3.4"]);
        let json = serde_json::to_value(&ep).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "dnsName": "a.de",
                "targets": ["1.2.3.4"],
                "recordType": "A",
                "recordTTL": 300
            })
        );

        let unset_ttl = endpoint("a.de", 0, &["1.2.3.4"]);
        let json = serde_json::to_value(&unset_ttl).unwrap();
        assert!(json.get("recordTTL").is_none());
    }

    #[test]
    fn test_changes_parsing_accepts_nulls() {
        let json = r#"{
            "Create": [{"dnsName": "a.de", "targets": ["1.2.3.4"], "recordType": "A", "recordTTL": 300, "labels": null}],
            "UpdateOld": null,
            "UpdateNew": null,
            "Delete": []
        }"#;

        let changes: Changes = serde_json::from_str(json).unwrap();
        assert_eq!(changes.create.len(), 1);
        assert_eq!(changes.create[0].record_ttl, 300);
        assert!(changes.create[0].labels.is_empty());
        assert!(changes.update_old.is_empty());
        assert!(changes.update_new.is_empty());
        assert!(changes.delete.is_empty());
    }

    #[test]
    fn test_changes_parsing_with_provider_specific() {
        let json = r#"{
            "Create": [{
                "dnsName": "txt.a.de",
                "targets": ["\"heritage=external-dns\""],
                "recordType": "TXT",
                "setIdentifier": "blue",
                "labels": {"owner": "default"},
                "providerSpecific": [{"name": "alias", "value": "false"}]
            }]
        }"#;

        let changes: Changes = serde_json::from_str(json).unwrap();
        let ep = &changes.create[0];
        assert_eq!(ep.record_ttl, 0);
        assert_eq!(ep.set_identifier, "blue");
        assert_eq!(ep.labels.get("owner").map(String::as_str), Some("default"));
        assert_eq!(ep.provider_specific[0].name, "alias");
        assert!(changes.delete.is_empty());
    }

    #[test]
    fn test_endpoint_display() {
        let ep = endpoint("a.de", 300, &["1.2.3.4", "5.6.7.8"]);
        assert_eq!(ep.to_string(), "a.de 300 IN A 1.2.3.4;5.6.7.8");
    }
}
