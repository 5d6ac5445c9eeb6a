mod config;
mod dedup;
mod forwarder;
mod monitor;
mod panel;
mod parser;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::forwarder::Forwarder;
use crate::monitor::Monitor;
use crate::panel::PanelSession;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,otp_relay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Panel: {}", config.panel.base_url);
    info!("  Receiver endpoint: {}", config.forwarder.endpoint_url);
    info!("  Poll interval: {}ms", config.monitor.poll_interval_ms);

    let backoff = Duration::from_secs(config.monitor.reconnect_backoff_secs);

    // Supervise loop: any session-fatal error tears the whole session
    // down and starts over from a fresh browser after a fixed backoff.
    loop {
        if let Err(e) = run_session(&config).await {
            error!("Session error: {e:#}");
            info!("Retrying in {} seconds...", backoff.as_secs());
            tokio::time::sleep(backoff).await;
        }
    }
}

async fn run_session(config: &Config) -> Result<()> {
    let session = PanelSession::launch(config.panel.clone(), config.selectors.clone()).await?;
    let forwarder = Forwarder::new(config.forwarder.clone())?;
    Monitor::new(session, forwarder, &config.monitor).run().await
}
