//! `anchorwatch-agent` -- anchor alarm push notifier.
//!
//! Subscribes to a Signal K server, watches the anchor alarm, depth alarm
//! and GPS position, and sends Pushover notifications on every change that
//! matters to a crew asleep below deck. See [`anchorwatch_agent::config`]
//! for the environment variables.

use anchorwatch_agent::config::AgentConfig;
use anchorwatch_agent::monitor::Monitor;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "anchorwatch_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AgentConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    tracing::info!(
        signalk_url = %config.signalk_ws_url,
        heartbeat_secs = config.settings.heartbeat_interval.map(|d| d.as_secs()),
        watchdog_secs = config.settings.watchdog_interval.map(|d| d.as_secs()),
        "Starting anchorwatch-agent",
    );

    let mut monitor = Monitor::start(config).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to start monitor");
        std::process::exit(1);
    });

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }

    monitor.stop().await;
}
