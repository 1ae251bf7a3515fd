//! # Secret Reactions Node
//!
//! Runs the reaction synchronizer against a local in-memory deployment.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (from env)
//! 2. Load configuration (`SR_CONFIG` JSON file, else defaults)
//! 3. Deploy locally, add the deployment to the loaded registry, connect the primary user
//! 4. Walk the catalogue through the demo scenario
//! 5. Disconnect

mod demo;

use anyhow::{Context, Result};
use sr_reaction_sync::{ContractRegistry, ReactionSyncConfig};
use sr_telemetry::{init_telemetry, TelemetryConfig};
use tracing::info;

/// Load configuration from environment.
fn load_config() -> Result<ReactionSyncConfig> {
    let mut config = match std::env::var("SR_CONFIG") {
        Ok(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path))?;
            ReactionSyncConfig::from_json(&json).context("Failed to parse config file")?
        }
        Err(_) => ReactionSyncConfig::default(),
    };

    if let Ok(path) = std::env::var("SR_REGISTRY") {
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read registry file {}", path))?;
        config.registry = ContractRegistry::from_json(&json).context("Failed to parse registry")?;
        info!(entries = config.registry.len(), "Loaded contract registry");
    }

    if let Ok(ms) = std::env::var("SR_REACT_SETTLE_MS") {
        config.react_settle_delay_ms = ms
            .parse()
            .with_context(|| format!("SR_REACT_SETTLE_MS must be an integer, got {}", ms))?;
    }

    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::for_component("node"))
        .context("Failed to initialize telemetry")?;

    let config = load_config()?;
    info!(
        session_days = config.session_duration_days,
        settle_ms = config.react_settle_delay_ms,
        "Starting Secret Reactions node"
    );

    demo::run(config).await?;

    info!("Node finished");
    Ok(())
}
