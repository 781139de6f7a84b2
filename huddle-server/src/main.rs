use anyhow::Context;
use huddle_server::{RelayConfig, RelayService, serve_with_shutdown};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = RelayConfig::from_env().context("Failed to load relay configuration")?;
    info!(
        capacity = config.room_capacity,
        buffer = config.channel_buffer,
        "Starting signaling relay"
    );

    let listener = TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;

    let service = RelayService::new(config);

    serve_with_shutdown(listener, service, shutdown_signal())
        .await
        .context("Relay server failed")?;

    info!("Signaling relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
