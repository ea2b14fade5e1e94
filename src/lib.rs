//! anexia-webhook - external-dns webhook provider for Anexia CloudDNS
//!
//! Architecture:
//! - `anexia`: CloudDNS v1 REST client behind the `DnsService` trait
//! - `projection` / `translator`: vendor records to endpoints and back
//! - `webhook`: external-dns webhook protocol over axum
//! - `health`: liveness and Prometheus metrics endpoint

pub mod anexia;
pub mod config;
pub mod constants;
pub mod dns_service;
pub mod domain_filter;
pub mod endpoint;
pub mod health;
pub mod metrics;
pub mod projection;
pub mod provider;
pub mod server;
pub mod translator;
pub mod validation;
pub mod webhook;

#[cfg(test)]
mod test_utils;
