//! Translation of external-dns changesets into vendor record calls
//!
//! The vendor identifies records by an opaque id the host never sees, so an
//! update is carried out as "find the matching record by content, delete it,
//! create the replacement". Deletions are issued before creations.

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::dns_service::{relative_name, DnsService, Record};
use crate::domain_filter::DomainFilter;
use crate::endpoint::{Changes, Endpoint};

//==============================================================================
// Types
//==============================================================================

/// Number of vendor mutations issued by one `apply`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub deleted: usize,
    pub created: usize,
}

/// Applies changesets through a [`DnsService`]
pub struct ChangeTranslator<'a> {
    client: &'a dyn DnsService,
    domain_filter: &'a DomainFilter,
}

//==============================================================================
// Update normalization
//==============================================================================

/// Splits a changeset into the endpoints to create and the endpoints to delete
///
/// Update pairs whose old and new endpoint differ become one delete plus one
/// create; identical pairs are dropped.
pub fn create_delete_sets(changes: &Changes) -> Result<(Vec<Endpoint>, Vec<Endpoint>)> {
    changes.check_updates()?;

    let mut to_create = changes.create.clone();
    let mut to_delete = changes.delete.clone();

    for (old, new) in changes.update_old.iter().zip(&changes.update_new) {
        if old.differs_from(new) {
            to_delete.push(old.clone());
            to_create.push(new.clone());
        } else {
            debug!("Update of {} is a no-op", old);
        }
    }

    Ok((to_create, to_delete))
}

//==============================================================================
// Translator
//==============================================================================

impl<'a> ChangeTranslator<'a> {
    pub fn new(client: &'a dyn DnsService, domain_filter: &'a DomainFilter) -> Self {
        Self {
            client,
            domain_filter,
        }
    }

    /// Applies `changes`: all deletions first, then all creations
    ///
    /// The first failing vendor mutation aborts the apply; mutations already
    /// issued are not rolled back.
    pub async fn apply(&self, changes: &Changes) -> Result<ApplySummary> {
        let (to_create, to_delete) = create_delete_sets(changes)?;
        debug!(
            "apply changes, create: {}, delete: {}",
            to_create.len(),
            to_delete.len()
        );

        let deletions = self.collect_deletions(&to_delete).await;
        for record in &deletions {
            self.client
                .delete_record(&record.zone_name, &record.identifier)
                .await?;
        }

        let creations = self.collect_creations(&to_create).await;
        for record in &creations {
            self.client.create_record(&record.zone_name, record).await?;
        }

        let summary = ApplySummary {
            deleted: deletions.len(),
            created: creations.len(),
        };
        if summary != ApplySummary::default() {
            info!(
                "Applied changes: {} deleted, {} created",
                summary.deleted, summary.created
            );
        }
        Ok(summary)
    }

    /// Finds the vendor records backing the endpoints to delete
    ///
    /// A lookup failure stops the scan; records found so far are returned.
    pub async fn collect_deletions(&self, endpoints: &[Endpoint]) -> Vec<Record> {
        let mut queued: Vec<Record> = Vec::new();

        'endpoints: for ep in endpoints {
            if self.filtered_out(ep) {
                continue;
            }
            let zones = match self.client.get_zones_by_domain_name(&ep.dns_name).await {
                Ok(zones) => zones,
                Err(e) => {
                    error!("failed to get zones for domain {}: {:#}", ep.dns_name, e);
                    break;
                }
            };

            for zone in &zones {
                let name = relative_name(&ep.dns_name, &zone.name);
                let records = match self
                    .client
                    .get_records_by_zone_and_name(&zone.name, &name)
                    .await
                {
                    Ok(records) => records,
                    Err(e) => {
                        error!(
                            "failed to get records for zone {} and name {}: {:#}",
                            zone.name, name, e
                        );
                        break 'endpoints;
                    }
                };

                for mut record in records {
                    if record.record_type != ep.record_type || !ep.targets.contains(&record.rdata) {
                        continue;
                    }
                    if queued.iter().any(|q| {
                        q.zone_name == zone.name && q.identifier == record.identifier
                    }) {
                        continue;
                    }
                    if record.zone_name.is_empty() {
                        record.zone_name = zone.name.clone();
                    }
                    debug!("queue deletion of {}", record);
                    queued.push(record);
                }
            }
        }

        queued
    }

    /// Builds the vendor records for the endpoints to create
    ///
    /// Each endpoint goes into its most specific zone, one record per target.
    /// A lookup failure stops the scan; records built so far are returned.
    pub async fn collect_creations(&self, endpoints: &[Endpoint]) -> Vec<Record> {
        let mut queued: Vec<Record> = Vec::new();

        for ep in endpoints {
            if self.filtered_out(ep) {
                continue;
            }
            let zones = match self.client.get_zones_by_domain_name(&ep.dns_name).await {
                Ok(zones) => zones,
                Err(e) => {
                    error!("failed to get zones for domain {}: {:#}", ep.dns_name, e);
                    break;
                }
            };
            let Some(zone) = zones.first() else {
                warn!("no zone found for domain {}", ep.dns_name);
                continue;
            };

            let name = relative_name(&ep.dns_name, &zone.name);
            for target in &ep.targets {
                queued.push(Record {
                    identifier: String::new(),
                    zone_name: zone.name.clone(),
                    name: name.clone(),
                    record_type: ep.record_type.clone(),
                    ttl: ep.record_ttl,
                    rdata: target.clone(),
                });
            }
        }

        queued
    }

    fn filtered_out(&self, ep: &Endpoint) -> bool {
        if self.domain_filter.is_configured() && !self.domain_filter.matches(&ep.dns_name) {
            debug!(
                "Skipping record {} because it was filtered out by the domain filter",
                ep.dns_name
            );
            return true;
        }
        false
    }
}

//==============================================================================
// Tests
//==============================================================================
