//! # SR Telemetry
//!
//! Logging bootstrap for Secret Reactions binaries.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sr_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SR_SERVICE_NAME` | `secret-reactions` | Service name in log lines |
//! | `SR_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `SR_JSON_LOGS` | `false` | JSON output (default on inside containers) |
//! | `SR_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `SR_NETWORK` | `hardhat` | Network label |

#![warn(missing_docs)]

mod config;
mod logging;

pub use config::{TelemetryConfig, DEFAULT_SERVICE_NAME};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Subscriber could not be installed (usually: one is already set).
    #[error("Failed to initialize logging: {0}")]
    Init(String),

    /// Bad filter directive or other configuration problem.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    logging::init_logging(&config)?;

    tracing::info!(
        service = %config.service_name,
        network = %config.network,
        json = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry...");
    }
}
