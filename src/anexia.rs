//! Anexia CloudDNS API client
//!
//! Uses reqwest with rustls for HTTP requests. [`AnexiaClient`] speaks the raw
//! REST API; [`DnsClient`] layers dry-run handling and metrics on top and
//! implements [`DnsService`] for the provider.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};
use urlencoding::encode;
use zeroize::Zeroizing;

use crate::constants::{
    ANEXIA_API_BASE, ANEXIA_USER_AGENT, CLOUDDNS_ZONE_PATH, HTTP_STATUS_FORBIDDEN,
    HTTP_STATUS_NOT_FOUND, HTTP_STATUS_SERVER_ERROR_MAX, HTTP_STATUS_SERVER_ERROR_MIN,
    HTTP_STATUS_TOO_MANY_REQUESTS, HTTP_STATUS_UNAUTHORIZED, MAX_LIST_PAGES, ZONE_PAGE_LIMIT,
};
use crate::dns_service::{DnsService, Record, Zone};
use crate::metrics;

//==============================================================================
// Errors
//==============================================================================

/// Non-success response from the Anexia API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Anexia API rejected the credentials ({status}): {body}")]
    Unauthorized { status: u16, body: String },
    #[error("Anexia API resource not found: {body}")]
    NotFound { body: String },
    #[error("Rate limited by Anexia API")]
    RateLimited,
    #[error("Anexia server error: {status}")]
    Server { status: u16 },
    #[error("Anexia API error ({status}): {body}")]
    Status { status: u16, body: String },
}

impl ApiError {
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            HTTP_STATUS_UNAUTHORIZED | HTTP_STATUS_FORBIDDEN => Self::Unauthorized { status, body },
            HTTP_STATUS_NOT_FOUND => Self::NotFound { body },
            HTTP_STATUS_TOO_MANY_REQUESTS => Self::RateLimited,
            HTTP_STATUS_SERVER_ERROR_MIN..=HTTP_STATUS_SERVER_ERROR_MAX => Self::Server { status },
            _ => Self::Status { status, body },
        }
    }

    /// Metric label for this error
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::NotFound { .. } => "not_found",
            Self::RateLimited => "rate_limit",
            Self::Server { .. } => "server",
            Self::Status { .. } => "status",
        }
    }
}

/// Classifies any client error for metrics
pub fn classify_error(err: &anyhow::Error) -> &'static str {
    if let Some(api) = err.downcast_ref::<ApiError>() {
        return api.error_type();
    }
    if let Some(http) = err.downcast_ref::<reqwest::Error>() {
        if http.is_timeout() {
            return "timeout";
        }
        if http.is_decode() {
            return "decode";
        }
        return "network";
    }
    "other"
}

//==============================================================================
// Wire types
//==============================================================================

/// Listings come back either as a bare array or wrapped in a page envelope
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListResponse<T> {
    Page(Page<T>),
    Items(Vec<T>),
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default)]
    page: usize,
    #[serde(default)]
    total_pages: usize,
    data: Vec<T>,
}

#[derive(Debug, Serialize)]
struct CreateRecordPayload<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    record_type: &'a str,
    rdata: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<i64>,
    region: &'a str,
}

//==============================================================================
// Client
//==============================================================================

pub struct AnexiaClient {
    api_token: Zeroizing<String>,
    base_url: String,
    client: reqwest::Client,
}

impl AnexiaClient {
    pub fn new(api_token: &str, base_url: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(ANEXIA_USER_AGENT)
            .build()
            .context("build reqwest client")?;

        let base_url = base_url
            .filter(|url| !url.is_empty())
            .unwrap_or(ANEXIA_API_BASE)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_token: Zeroizing::new(api_token.to_string()),
            base_url,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Lists all zones, following pagination
    pub async fn list_zones(&self) -> Result<Vec<Zone>> {
        let url = format!("{}{}", self.base_url, CLOUDDNS_ZONE_PATH);
        self.list_all(&url, &[]).await
    }

    /// Lists the records of `zone`, optionally restricted to one relative name
    pub async fn list_records(&self, zone: &str, name: Option<&str>) -> Result<Vec<Record>> {
        let url = self.records_url(zone);
        let filter: Vec<(&str, &str)> = name.map(|n| ("name", n)).into_iter().collect();
        let mut records: Vec<Record> = self.list_all(&url, &filter).await?;
        for record in &mut records {
            record.zone_name = zone.to_string();
        }
        Ok(records)
    }

    /// Creates a record in `zone`
    pub async fn create_record(&self, zone: &str, record: &Record) -> Result<()> {
        let url = self.records_url(zone);
        let payload = CreateRecordPayload {
            name: &record.name,
            record_type: &record.record_type,
            rdata: &record.rdata,
            ttl: Some(record.ttl).filter(|ttl| *ttl > 0),
            region: "",
        };

        debug!("POST {}", url);
        self.send(self.client.post(&url).json(&payload))
            .await
            .context("POST request failed")?;
        Ok(())
    }

    /// Deletes the record `record_id` from `zone`
    pub async fn destroy_record(&self, zone: &str, record_id: &str) -> Result<()> {
        let url = format!("{}/{}", self.records_url(zone), encode(record_id));

        debug!("DELETE {}", url);
        self.send(self.client.delete(&url))
            .await
            .context("DELETE request failed")?;
        Ok(())
    }

    fn records_url(&self, zone: &str) -> String {
        format!(
            "{}{}/{}/records",
            self.base_url,
            CLOUDDNS_ZONE_PATH,
            encode(zone)
        )
    }

    /// Fetches every page of a listing
    ///
    /// Envelopes carry their own paging. A bare array ends the listing when it
    /// is short or repeats the previous page, since some endpoints ignore
    /// `page` and `limit` and always answer with the complete list.
    async fn list_all<T>(&self, url: &str, filter: &[(&str, &str)]) -> Result<Vec<T>>
    where
        T: for<'de> Deserialize<'de> + PartialEq,
    {
        let mut items = Vec::new();
        let mut last_batch_len: Option<usize> = None;
        let limit = ZONE_PAGE_LIMIT.to_string();

        for page in 1..=MAX_LIST_PAGES {
            let page_param = page.to_string();
            let mut query = vec![("page", page_param.as_str()), ("limit", limit.as_str())];
            query.extend_from_slice(filter);

            debug!("GET {} (page {})", url, page);
            let resp = self
                .send(self.client.get(url).query(&query))
                .await
                .context("GET request failed")?;
            let body: ListResponse<T> = resp.json().await.context("Failed to parse response")?;

            let done = match body {
                ListResponse::Page(p) => {
                    let done = p.data.is_empty() || p.page.max(page) >= p.total_pages;
                    items.extend(p.data);
                    done
                }
                ListResponse::Items(batch) => {
                    let repeated = last_batch_len == Some(batch.len())
                        && items[items.len() - batch.len()..] == batch[..];
                    if repeated {
                        debug!("{} ignores paging, page {} repeats page {}", url, page, page - 1);
                        return Ok(items);
                    }
                    let done = batch.len() < ZONE_PAGE_LIMIT;
                    last_batch_len = Some(batch.len());
                    items.extend(batch);
                    done
                }
            };
            if done {
                return Ok(items);
            }
        }

        bail!("Listing {} exceeded {} pages", url, MAX_LIST_PAGES)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let resp = request
            .header(AUTHORIZATION, format!("Token {}", self.api_token.as_str()))
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ApiError::from_status(status.as_u16(), body).into())
    }
}

//==============================================================================
// DnsService implementation
//==============================================================================

/// [`DnsService`] backed by the Anexia API, honoring dry-run mode
pub struct DnsClient {
    api: AnexiaClient,
    dry_run: bool,
}

impl DnsClient {
    pub fn new(api: AnexiaClient, dry_run: bool) -> Self {
        Self { api, dry_run }
    }
}

fn observe<T>(operation: &str, result: Result<T>) -> Result<T> {
    metrics::record_vendor_request(operation);
    if let Err(e) = &result {
        metrics::record_vendor_error(operation, classify_error(e));
    }
    result
}

#[async_trait]
impl DnsService for DnsClient {
    async fn get_zones(&self) -> Result<Vec<Zone>> {
        debug!("get all zones ...");
        let result = observe("list_zones", self.api.list_zones().await);
        if let Err(e) = &result {
            error!("failed to list zones: {:#}", e);
        }
        result
    }

    async fn get_records(&self) -> Result<Vec<Record>> {
        debug!("get all records ...");
        let zones = self.get_zones().await?;

        let mut records = Vec::new();
        for zone in &zones {
            debug!("get records for zone {} ...", zone.name);
            let zone_records = observe("list_records", self.api.list_records(&zone.name, None).await)
                .map_err(|e| {
                    error!("failed to list records for zone {}: {:#}", zone.name, e);
                    e
                })?;
            records.extend(zone_records);
        }
        Ok(records)
    }

    async fn get_records_by_zone_and_name(&self, zone: &str, name: &str) -> Result<Vec<Record>> {
        debug!("get records for zone {} and name {} ...", zone, name);
        let records = observe("list_records", self.api.list_records(zone, Some(name)).await)
            .map_err(|e| {
                error!("failed to list records for zone {} and name {}: {:#}", zone, name, e);
                e
            })?;
        // The vendor filter may be a substring match
        Ok(records
            .into_iter()
            .filter(|r| r.name == name || (name == "@" && r.is_apex()))
            .collect())
    }

    async fn create_record(&self, zone: &str, record: &Record) -> Result<()> {
        if self.dry_run {
            info!("dry run: would create record {} in zone {}", record, zone);
            return Ok(());
        }
        debug!("create record {} ...", record);
        observe("create_record", self.api.create_record(zone, record).await).map_err(|e| {
            error!("failed to create record {}: {:#}", record, e);
            e
        })?;
        metrics::record_change("created");
        debug!("record created");
        Ok(())
    }

    async fn delete_record(&self, zone: &str, record_id: &str) -> Result<()> {
        if self.dry_run {
            info!("dry run: would delete record {} in zone {}", record_id, zone);
            return Ok(());
        }
        debug!("delete record {} ...", record_id);
        observe("delete_record", self.api.destroy_record(zone, record_id).await).map_err(|e| {
            error!("failed to delete record {}: {:#}", record_id, e);
            e
        })?;
        metrics::record_change("deleted");
        debug!("record deleted");
        Ok(())
    }
}

//==============================================================================
// Tests
//==============================================================================
