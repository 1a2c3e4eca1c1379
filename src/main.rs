mod config;
mod hub;
mod publisher;
mod sensor;

use anyhow::Context;
use config::SimulatorConfig;
use hub::HubClient;
use publisher::Scheduler;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sensor::SensorFleet;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = SimulatorConfig::from_env()?;

    let client = Arc::new(HubClient::new(
        &config.connection_string,
        config.connect_timeout,
        config.request_timeout,
    ));
    match client.credentials() {
        Ok(credentials) => info!("Hub: {} as {}", credentials.address(), credentials.device_id()),
        Err(e) => warn!("Connection string unusable ({}); every hub operation will fail", e),
    }

    let fleet = SensorFleet::initialize();
    for reading in fleet.readings() {
        info!("  Simulating {} ({})", reading.device_id(), reading.location());
    }

    let scheduler = Scheduler::start(
        fleet,
        StdRng::from_entropy(),
        client.clone(),
        client,
        config.cadence(),
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Ctrl-C received, shutting down");
    scheduler.stop();

    Ok(())
}
