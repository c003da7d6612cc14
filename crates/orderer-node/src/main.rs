//! # Quantum-Chain Orderer
//!
//! Entry point of the ordering service node.

use anyhow::{Context, Result};
use orderer_node::{NodeConfig, OrdererRuntime};
use quantum_telemetry::{init_telemetry, TelemetryConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(&TelemetryConfig::from_env()).context("Failed to initialize telemetry")?;

    let config = NodeConfig::load()?;

    let runtime = OrdererRuntime::new(config)?;
    runtime.start();
    let system_halted = runtime.system_errored()?.halted();

    info!("Orderer is running. Press Ctrl+C to stop.");
    tokio::select! {
        signal = tokio::signal::ctrl_c() => signal.context("Failed to listen for Ctrl+C")?,
        _ = system_halted => error!("System channel halted, stopping orderer"),
    }

    runtime.shutdown();
    Ok(())
}
