//! # Offer Telemetry
//!
//! Logging and metrics for the offer signer.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use offer_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     init_telemetry(&TelemetryConfig::from_env()).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OFFER_SERVICE_NAME` | `offer-signer` | Service name in logs |
//! | `OFFER_LOG_LEVEL` | `info` | Log level filter |
//! | `OFFER_JSON_LOGS` | `false` | JSON formatted logs |

#![warn(missing_docs)]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, SIGNATURES_CONVERTED,
    SIGNATURES_NORMALIZED, SIGNING_DURATION, SIGNING_FAILURES,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global subscriber could not be installed
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Prometheus registration or encoding failed
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install the global log subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    logging::init_logging(config)
}
