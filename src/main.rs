// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::EnvFilter;

use crate::application::machine_data_service::MachineDataService;
use crate::infrastructure::config::load_bridge_config;
use crate::infrastructure::influx_client::InfluxClient;
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_bridge_config()?;

    // Create time-series client (infrastructure layer)
    let client = Arc::new(InfluxClient::new(&config.influx, config.retry.clone())?);

    // Create service (application layer)
    let machine_data_service = MachineDataService::new(client, config.store.clone());

    let state = Arc::new(AppState {
        machine_data_service,
    });

    // Build router (presentation layer)
    let router = build_router(state);

    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!("Starting machine-telemetry-bridge on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
