//! Heatnet Console
//!
//! Operator console and tenant portal for a district-heating network.

use heatnet_console::{api, bus, config, pollers::Startable, routes};

use anyhow::Result;
use std::net::SocketAddr;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "heatnet_console=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Starting Heatnet Console v{} ({})",
        env!("HNC_VERSION"),
        env!("HNC_GIT_SHA")
    );

    let config = config::load_config()?;
    tracing::info!(
        port = config.port,
        api = %config.api.base_url,
        demo_fallback = config.demo.fallback,
        "Configuration loaded"
    );

    let bus = bus::create_bus();
    let state = api::AppState::new(config, bus)?;

    let pollers: [&dyn Startable; 1] = [&state.gateways];
    for poller in pollers {
        if !poller.can_start().await {
            tracing::info!("{} not configured, skipping", poller.name());
            continue;
        }
        if let Err(e) = poller.start().await {
            tracing::warn!("Failed to start {}: {}", poller.name(), e);
        }
    }

    let app = routes::build_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down pollers...");
    for poller in pollers {
        poller.stop().await;
    }
    state.readers.shutdown().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
