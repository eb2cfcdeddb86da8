//! # KeyMesh Telemetry
//!
//! Structured logging and Prometheus metrics for KeyMesh nodes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use keymesh_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = TelemetryConfig::from_env().for_board("1234", false);
//!     let _guard = init_telemetry(&config)?;
//!     // Logs and metrics are now being collected
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `KM_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `KM_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `KM_JSON_LOGS` | `false` | JSON instead of pretty logs |
//! | `KM_METRICS_PORT` | `9100` | Admin/metrics HTTP port, `0` disables |

mod config;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, ACTIVE_SESSIONS, BUS_MESSAGES_RECEIVED,
    EXCHANGE_ROUND_TRIP, PENDING_REQUESTS, REQUESTS_ANSWERED, REQUESTS_ISSUED, REQUEST_RETRIES,
    REQUEST_TIMEOUTS, RESPONSES_RESOLVED, SESSIONS_COMPLETED, SESSIONS_FAILED, SESSIONS_STARTED,
    UNKNOWN_CORRELATIONS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install the global tracing subscriber.
///
/// Returns a guard that must be held for the lifetime of the application.
///
/// # Errors
///
/// Fails if the log filter does not parse, a subscriber is already
/// installed, or metric registration fails.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    tracing_setup::init_tracing(config)?;

    tracing::info!(
        service = %config.service_name,
        board = %config.board_id,
        log_level = %config.log_level,
        json = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard { _metrics: metrics })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Increment a counter, optionally by label values.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Record an observation on a histogram, optionally by label values.
#[macro_export]
macro_rules! metric_observe {
    ($metric:expr, $value:expr) => {
        $metric.observe($value)
    };
    ($metric:expr, $labels:expr, $value:expr) => {
        $metric.with_label_values($labels).observe($value)
    };
}
