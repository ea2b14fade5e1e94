//! Test helpers
//!
//! In-memory [`DnsService`] double that records every mutating call.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::dns_service::{DnsService, Record, Zone};
use crate::endpoint::{Endpoint, Targets};

/// Mutating call observed by [`MockDnsService`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create { zone: String, record: Record },
    Delete { zone: String, record_id: String },
}

#[derive(Default)]
pub struct MockDnsService {
    zones: Vec<Zone>,
    records: HashMap<String, Vec<Record>>,
    /// Error returned by every listing call
    list_error: Option<String>,
    /// Error returned by `get_zones_by_domain_name` for this DNS name
    zone_lookup_error: Option<String>,
    /// Fail the n-th mutating call (0-based)
    fail_mutation_at: Option<usize>,
    /// Latency of every mutating call
    mutation_delay: Option<Duration>,
    calls: Mutex<Vec<Call>>,
}

impl MockDnsService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a zone with its records; identifiers are assigned as "0", "1", ...
    pub fn with_zone(mut self, zone: &str, records: &[(&str, &str, i64, &str)]) -> Self {
        self.zones.push(Zone::new(zone));
        let records = records
            .iter()
            .enumerate()
            .map(|(i, (name, record_type, ttl, rdata))| Record {
                identifier: i.to_string(),
                zone_name: zone.to_string(),
                name: name.to_string(),
                record_type: record_type.to_string(),
                ttl: *ttl,
                rdata: rdata.to_string(),
            })
            .collect();
        self.records.insert(zone.to_string(), records);
        self
    }

    pub fn with_list_error(mut self, message: &str) -> Self {
        self.list_error = Some(message.to_string());
        self
    }

    pub fn with_zone_lookup_error(mut self, dns_name: &str) -> Self {
        self.zone_lookup_error = Some(dns_name.to_string());
        self
    }

    pub fn with_failing_mutation(mut self, index: usize) -> Self {
        self.fail_mutation_at = Some(index);
        self
    }

    pub fn with_mutation_delay(mut self, delay: Duration) -> Self {
        self.mutation_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<Record> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create { record, .. } => Some(record),
                Call::Delete { .. } => None,
            })
            .collect()
    }

    pub fn deleted(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete { zone, record_id } => Some((zone, record_id)),
                Call::Create { .. } => None,
            })
            .collect()
    }

    fn check_list(&self) -> Result<()> {
        match &self.list_error {
            Some(msg) => Err(anyhow!(msg.clone())),
            None => Ok(()),
        }
    }

    async fn delay(&self) {
        if let Some(delay) = self.mutation_delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn push_call(&self, call: Call) -> Result<()> {
        let mut calls = self.calls.lock().unwrap();
        if self.fail_mutation_at == Some(calls.len()) {
            return Err(anyhow!("mutation failed"));
        }
        calls.push(call);
        Ok(())
    }
}

#[async_trait]
impl DnsService for MockDnsService {
    async fn get_zones(&self) -> Result<Vec<Zone>> {
        self.check_list()?;
        Ok(self.zones.clone())
    }

    async fn get_records(&self) -> Result<Vec<Record>> {
        self.check_list()?;
        Ok(self
            .zones
            .iter()
            .flat_map(|z| self.records.get(&z.name).cloned().unwrap_or_default())
            .collect())
    }

    async fn get_records_by_zone_and_name(&self, zone: &str, name: &str) -> Result<Vec<Record>> {
        self.check_list()?;
        Ok(self
            .records
            .get(zone)
            .map(|records| records.iter().filter(|r| r.name == name || (name == "@" && r.is_apex())).cloned().collect())
            .unwrap_or_default())
    }

    async fn get_zones_by_domain_name(&self, dns_name: &str) -> Result<Vec<Zone>> {
        if self.zone_lookup_error.as_deref() == Some(dns_name) {
            return Err(anyhow!("zone lookup failed for {}", dns_name));
        }
        let zones = self.get_zones().await?;
        Ok(crate::dns_service::zones_for_domain(zones, dns_name))
    }

    async fn create_record(&self, zone: &str, record: &Record) -> Result<()> {
        self.delay().await;
        self.push_call(Call::Create {
            zone: zone.to_string(),
            record: record.clone(),
        })
    }

    async fn delete_record(&self, zone: &str, record_id: &str) -> Result<()> {
        self.delay().await;
        self.push_call(Call::Delete {
            zone: zone.to_string(),
            record_id: record_id.to_string(),
        })
    }
}

/// Shorthand endpoint constructor
pub fn endpoint(name: &str, record_type: &str, ttl: i64, targets: &[&str]) -> Endpoint {
    Endpoint::new(name, record_type, ttl, Targets::new(targets.iter().copied()))
}

/// Record as the translator builds it for creation
pub fn new_record(zone: &str, name: &str, record_type: &str, ttl: i64, rdata: &str) -> Record {
    Record {
        identifier: String::new(),
        zone_name: zone.to_string(),
        name: name.to_string(),
        record_type: record_type.to_string(),
        ttl,
        rdata: rdata.to_string(),
    }
}
