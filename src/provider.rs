//! Anexia provider facade
//!
//! Ties the vendor client, the endpoint projection and the change translator
//! together behind the operations external-dns drives through the webhook.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use tracing::{info, warn};

use crate::anexia::{AnexiaClient, DnsClient};
use crate::config::Config;
use crate::dns_service::DnsService;
use crate::domain_filter::DomainFilter;
use crate::endpoint::{Changes, Endpoint};
use crate::projection::project;
use crate::translator::{ApplySummary, ChangeTranslator};

//==============================================================================
// Provider
//==============================================================================

/// external-dns provider backed by Anexia CloudDNS
pub struct AnexiaProvider {
    client: Arc<dyn DnsService>,
    domain_filter: DomainFilter,
}

impl AnexiaProvider {
    /// Creates the provider and its Anexia API client from `config`
    pub fn new(config: &Config) -> Result<Self> {
        let domain_filter = config.domain_filter()?;
        info!("Creating anexia provider with {}", domain_filter.describe());

        match config.api_url.as_deref() {
            Some(url) => info!("Using Anexia API at {}", url),
            None => warn!("API endpoint URL is not set, using default"),
        }
        let api = AnexiaClient::new(
            config.api_token.as_str(),
            config.api_url.as_deref(),
            config.timeout,
        )
        .context("failed to create Anexia client")?;
        if config.dry_run {
            warn!("Dry run mode enabled, no changes will be made");
        }

        Ok(Self::with_client(
            Arc::new(DnsClient::new(api, config.dry_run)),
            domain_filter,
        ))
    }

    /// Creates a provider around an existing client
    pub fn with_client(client: Arc<dyn DnsService>, domain_filter: DomainFilter) -> Self {
        Self {
            client,
            domain_filter,
        }
    }

    pub fn domain_filter(&self) -> &DomainFilter {
        &self.domain_filter
    }

    /// Returns the current vendor state as endpoints
    pub async fn records(&self) -> Result<Vec<Endpoint>> {
        let records = self.client.get_records().await?;
        Ok(project(&records, &self.domain_filter))
    }

    /// Applies a changeset computed by external-dns
    pub async fn apply_changes(&self, changes: &Changes) -> Result<ApplySummary> {
        ChangeTranslator::new(self.client.as_ref(), &self.domain_filter)
            .apply(changes)
            .await
    }

    /// Endpoints are passed through unchanged
    pub fn adjust_endpoints(&self, endpoints: Vec<Endpoint>) -> Result<Vec<Endpoint>> {
        Ok(endpoints)
    }
}

//==============================================================================
// Tests
//==============================================================================
