//! external-dns webhook server
//!
//! Exposes the provider over the external-dns webhook protocol
//! (`application/external.dns.webhook+json;version=1`).

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::constants::WEBHOOK_MEDIA_TYPE;
use crate::endpoint::{Changes, Endpoint};
use crate::health::{Operation, SharedHealth};
use crate::metrics;
use crate::provider::AnexiaProvider;

//==============================================================================
// Types
//==============================================================================

/// Request failures mapped onto webhook status codes
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("client must accept {}", WEBHOOK_MEDIA_TYPE)]
    NotAcceptable,
    #[error("content type must be {}", WEBHOOK_MEDIA_TYPE)]
    UnsupportedMediaType,
    #[error("invalid request body: {0}")]
    BadRequest(String),
    #[error("{0:#}")]
    Provider(anyhow::Error),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            WebhookError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            WebhookError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WebhookError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// Shared state of the webhook handlers
///
/// Requests carry no deadline of their own; every vendor call is bounded by
/// the client timeout, so a changeset is never cut off between mutations.
#[derive(Clone)]
pub struct WebhookState {
    provider: Arc<AnexiaProvider>,
    health: SharedHealth,
    /// Serializes changeset application
    apply_lock: Arc<Mutex<()>>,
}

impl WebhookState {
    pub fn new(provider: Arc<AnexiaProvider>, health: SharedHealth) -> Self {
        Self {
            provider,
            health,
            apply_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn track<T>(&self, operation: Operation, result: &Result<T, WebhookError>) {
        let mut health = self.health.lock().await;
        match result {
            Ok(_) => health.record_success(operation),
            Err(e) => {
                health.record_failure();
                error!(
                    "{:?} failed ({} consecutive errors): {}",
                    operation, health.error_count, e
                );
            }
        }
    }
}

//==============================================================================
// Router
//==============================================================================

/// Builds the webhook router
pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/", get(negotiate))
        .route("/records", get(records).post(apply_changes))
        .route("/adjustendpoints", post(adjust_endpoints))
        .layer(middleware::map_response(webhook_headers))
        .with_state(state)
}

async fn webhook_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(WEBHOOK_MEDIA_TYPE),
    );
    headers.insert(header::VARY, HeaderValue::from_static("Content-Type"));
    response
}

//==============================================================================
// Handlers
//==============================================================================

async fn negotiate(
    State(state): State<WebhookState>,
    headers: HeaderMap,
) -> Result<Response, WebhookError> {
    let _timer = metrics::start_request_timer("negotiate");
    require_media_type(&headers, header::ACCEPT, WebhookError::NotAcceptable)?;
    Ok(Json(state.provider.domain_filter()).into_response())
}

async fn records(
    State(state): State<WebhookState>,
    headers: HeaderMap,
) -> Result<Response, WebhookError> {
    let _timer = metrics::start_request_timer("records");
    require_media_type(&headers, header::ACCEPT, WebhookError::NotAcceptable)?;

    let result = state
        .provider
        .records()
        .await
        .map_err(WebhookError::Provider);
    state.track(Operation::Records, &result).await;
    let endpoints = result?;

    debug!("Returning {} endpoints", endpoints.len());
    Ok(Json(endpoints).into_response())
}

async fn apply_changes(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookError> {
    let _timer = metrics::start_request_timer("apply_changes");
    require_media_type(
        &headers,
        header::CONTENT_TYPE,
        WebhookError::UnsupportedMediaType,
    )?;

    let changes: Changes =
        serde_json::from_slice(&body).map_err(|e| WebhookError::BadRequest(e.to_string()))?;
    changes
        .check_updates()
        .map_err(|e| WebhookError::BadRequest(format!("{:#}", e)))?;
    if changes.is_empty() {
        debug!("Empty changeset, nothing to apply");
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let _guard = state.apply_lock.lock().await;
    let result = state
        .provider
        .apply_changes(&changes)
        .await
        .map_err(WebhookError::Provider);
    state.track(Operation::Apply, &result).await;
    let summary = result?;

    debug!(
        "Changeset done: {} records deleted, {} records created",
        summary.deleted, summary.created
    );
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn adjust_endpoints(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookError> {
    let _timer = metrics::start_request_timer("adjust_endpoints");
    require_media_type(
        &headers,
        header::CONTENT_TYPE,
        WebhookError::UnsupportedMediaType,
    )?;

    let endpoints: Vec<Endpoint> =
        serde_json::from_slice(&body).map_err(|e| WebhookError::BadRequest(e.to_string()))?;
    let adjusted = state
        .provider
        .adjust_endpoints(endpoints)
        .map_err(WebhookError::Provider)?;
    Ok(Json(adjusted).into_response())
}

//==============================================================================
// Helpers
//==============================================================================

fn require_media_type(
    headers: &HeaderMap,
    name: HeaderName,
    err: WebhookError,
) -> Result<(), WebhookError> {
    if has_media_type(headers, &name) {
        Ok(())
    } else {
        Err(err)
    }
}

/// Whether any value of `name` lists the webhook media type
fn has_media_type(headers: &HeaderMap, name: &HeaderName) -> bool {
    let wanted = normalize_media_type(WEBHOOK_MEDIA_TYPE);
    headers
        .get_all(name)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|v| normalize_media_type(v) == wanted)
}

fn normalize_media_type(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase()
}

//==============================================================================
// Tests
//==============================================================================
