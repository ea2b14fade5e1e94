//! Server lifecycle for anexia-webhook
//!
//! Binds the webhook and health listeners and runs them until SIGTERM or
//! Ctrl-C.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::health::{self, HealthState, SharedHealth};
use crate::provider::AnexiaProvider;
use crate::webhook::{self, WebhookState};

//==============================================================================
// Server
//==============================================================================

pub struct Server {
    config: Config,
    provider: Arc<AnexiaProvider>,
    health: SharedHealth,
}

impl Server {
    pub fn new(config: Config, provider: Arc<AnexiaProvider>) -> Self {
        let health = HealthState::shared(config.dry_run);
        Self {
            config,
            provider,
            health,
        }
    }

    /// Runs the webhook (and health) servers
    ///
    /// This method:
    /// 1. Binds the webhook listener on `server_host:server_port`
    /// 2. Binds the health listener on `0.0.0.0:health_port` unless disabled
    /// 3. Waits for SIGTERM or Ctrl-C, then shuts both down gracefully
    ///
    /// Returns an error if a listener cannot be bound or a server fails.
    pub async fn run(self) -> Result<()> {
        info!("Starting anexia-webhook");
        info!(
            "Mode: {}",
            if self.config.dry_run { "dry run" } else { "live" }
        );
        debug!("Config: {:?}", self.config);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let webhook_addr = format!("{}:{}", self.config.server_host, self.config.server_port);
        let listener = TcpListener::bind(&webhook_addr)
            .await
            .with_context(|| format!("Failed to bind webhook server on {}", webhook_addr))?;
        info!("Webhook server listening on {}", listener.local_addr()?);

        let state = WebhookState::new(Arc::clone(&self.provider), Arc::clone(&self.health));
        let mut webhook_task = tokio::spawn(serve(
            listener,
            webhook::router(state),
            shutdown_rx.clone(),
        ));

        let health_task = self.start_health(shutdown_rx).await?;

        tokio::select! {
            signal = wait_for_signal() => signal?,
            result = &mut webhook_task => {
                return result.context("Webhook server task failed")?;
            }
        }

        let _ = shutdown_tx.send(true);
        webhook_task.await.context("Webhook server task failed")??;
        if let Some(task) = health_task {
            task.await.context("Health server task failed")??;
        }

        info!("Server stopped");
        Ok(())
    }

    async fn start_health(
        &self,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Option<JoinHandle<Result<()>>>> {
        if self.config.health_port == 0 {
            info!("Health check server disabled");
            return Ok(None);
        }

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.health_port));
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind health server on {}", addr))?;
        info!("Health check server listening on {}", addr);

        Ok(Some(tokio::spawn(serve(
            listener,
            health::router(Arc::clone(&self.health)),
            shutdown,
        ))))
    }
}

//==============================================================================
// Helpers
//==============================================================================

/// Serves `app` until `shutdown` flips
pub async fn serve(
    listener: TcpListener,
    app: Router,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await
        .context("Server error")
}

async fn wait_for_signal() -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigterm.recv() => info!("SIGTERM received"),
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!("Ctrl-C handler failed: {}", e);
            } else {
                info!("Ctrl-C received");
            }
        }
    }
    Ok(())
}

//==============================================================================
// Tests
//==============================================================================
