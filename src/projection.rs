//! Projection of vendor records onto external-dns endpoints

use std::collections::HashMap;

use tracing::debug;

use crate::dns_service::Record;
use crate::domain_filter::DomainFilter;
use crate::endpoint::{Endpoint, Targets};

/// Converts a single vendor record into a one-target endpoint
pub fn record_to_endpoint(record: &Record) -> Endpoint {
    Endpoint::new(
        &record.fqdn(),
        &record.record_type,
        record.ttl,
        Targets::new([record.rdata.as_str()]),
    )
}

/// Projects vendor records onto endpoints
///
/// Records failing a configured `filter` are dropped. Records sharing FQDN and
/// type are merged into one endpoint carrying the first record's TTL and every
/// record's target in encounter order. Endpoints are emitted in the order their
/// first record was seen.
pub fn project(records: &[Record], filter: &DomainFilter) -> Vec<Endpoint> {
    let mut endpoints: Vec<Endpoint> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for record in records {
        let ep = record_to_endpoint(record);
        if filter.is_configured() && !filter.matches(&ep.dns_name) {
            debug!(
                "Skipping record {} because it was filtered out by the domain filter",
                ep.dns_name
            );
            continue;
        }

        let key = (ep.dns_name.clone(), ep.record_type.clone());
        match index.get(&key) {
            Some(&pos) => endpoints[pos].targets.0.extend(ep.targets.0),
            None => {
                index.insert(key, endpoints.len());
                endpoints.push(ep);
            }
        }
    }

    endpoints
}

//==============================================================================
// Tests
//==============================================================================
