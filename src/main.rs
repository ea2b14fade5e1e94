//! anexia-webhook - external-dns webhook provider for Anexia CloudDNS

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use anexia_webhook::config::{Config, LogFormat};
use anexia_webhook::provider::AnexiaProvider;
use anexia_webhook::server::Server;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

//==============================================================================
// Main
//==============================================================================

#[derive(Debug, Parser)]
#[command(name = "anexia-webhook")]
#[command(version = VERSION)]
struct Args {
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(args.config).context("Config load failed")?;

    init_tracing(&config);
    println!("anexia-webhook {} - external-dns provider for Anexia CloudDNS", VERSION);

    let provider = AnexiaProvider::new(&config).context("Provider init failed")?;
    Server::new(config, Arc::new(provider)).run().await
}

/// `RUST_LOG` wins over the configured log level
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    match config.log_format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}
