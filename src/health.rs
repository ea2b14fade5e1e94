//! Health check endpoint for anexia-webhook
//!
//! This module provides a lightweight HTTP endpoint for liveness checks and the
//! Prometheus metrics exposition.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::constants::UNHEALTHY_ERROR_THRESHOLD;
use crate::metrics;

//==============================================================================
// Types
//==============================================================================

/// Provider operation tracked by the health state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Records,
    Apply,
}

/// Shared health state updated by the webhook handlers
#[derive(Debug, Default)]
pub struct HealthState {
    pub dry_run: bool,
    pub last_records: Option<DateTime<Utc>>,
    pub last_apply: Option<DateTime<Utc>>,
    /// Consecutive failed provider operations
    pub error_count: u64,
}

pub type SharedHealth = Arc<Mutex<HealthState>>;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall health status
    pub status: String,
    pub dry_run: bool,
    /// Time since the last successful records call (null if never)
    pub last_records_seconds_ago: Option<f64>,
    /// Time since the last successful apply (null if never)
    pub last_apply_seconds_ago: Option<f64>,
    /// Number of consecutive errors
    pub error_count: u64,
    /// Whether the provider is healthy
    pub healthy: bool,
}

//==============================================================================
// Implementation
//==============================================================================

impl HealthState {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    pub fn shared(dry_run: bool) -> SharedHealth {
        Arc::new(Mutex::new(Self::new(dry_run)))
    }

    pub fn record_success(&mut self, operation: Operation) {
        let now = Utc::now();
        match operation {
            Operation::Records => self.last_records = Some(now),
            Operation::Apply => self.last_apply = Some(now),
        }
        self.error_count = 0;
        metrics::set_error_count(0);
    }

    pub fn record_failure(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
        metrics::set_error_count(self.error_count);
    }

    pub fn is_healthy(&self) -> bool {
        self.error_count < UNHEALTHY_ERROR_THRESHOLD
    }
}

/// Builds the health router (`/healthz`, `/metrics`)
pub fn router(state: SharedHealth) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

async fn healthz(State(state): State<SharedHealth>) -> impl IntoResponse {
    let response = build_response(&*state.lock().await);
    let status = if response.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::gather_metrics(),
    )
}

//==============================================================================
// Helpers
//==============================================================================

fn seconds_since(ts: Option<DateTime<Utc>>) -> Option<f64> {
    ts.map(|ts| (Utc::now() - ts).num_seconds().max(0) as f64)
}

fn build_response(state: &HealthState) -> HealthResponse {
    let healthy = state.is_healthy();
    HealthResponse {
        status: if healthy { "ok".to_string() } else { "degraded".to_string() },
        dry_run: state.dry_run,
        last_records_seconds_ago: seconds_since(state.last_records),
        last_apply_seconds_ago: seconds_since(state.last_apply),
        error_count: state.error_count,
        healthy,
    }
}

//==============================================================================
// Tests
//==============================================================================
