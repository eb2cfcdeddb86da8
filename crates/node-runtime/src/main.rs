//! # KeyMesh Node
//!
//! Entry point for a KeyMesh board.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from the environment
//! 2. Initialize logging and metrics
//! 3. Build the components and start exchanges with configured peers
//! 4. Serve the admin router
//! 5. Run until Ctrl+C, then shut down gracefully

use anyhow::{Context, Result};
use keymesh_telemetry::{init_telemetry, TelemetryConfig};
use node_runtime::{NodeConfig, NodeRuntime};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::from_env().context("Invalid node configuration")?;
    config.validate().context("Invalid node configuration")?;

    let telemetry = TelemetryConfig::from_env().for_board(&config.board.uid, config.debug);
    let _telemetry = init_telemetry(&telemetry).context("Failed to initialize telemetry")?;

    let runtime = NodeRuntime::new(config)?;
    runtime.start().await?;
    runtime.serve_admin(telemetry.metrics_port).await?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}
