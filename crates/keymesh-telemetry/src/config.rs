//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,

    /// Board this node runs as
    pub board_id: String,

    /// Log filter directive (trace, debug, info, warn, error, or a full
    /// `EnvFilter` directive such as `km_02_correlation_tracker=trace`)
    pub log_level: String,

    /// Whether to write logs to stdout
    pub console_output: bool,

    /// JSON formatted logs instead of the pretty formatter
    pub json_logs: bool,

    /// Admin/metrics HTTP port; 0 disables the listener
    pub metrics_port: u16,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "keymesh".to_string(),
            board_id: "0000".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            metrics_port: 9100,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `KM_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `KM_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `KM_JSON_LOGS`: Enable JSON logs (default: false)
    /// - `KM_METRICS_PORT`: Admin/metrics port (default: 9100)
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Unparseable values fall back
    /// to defaults.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            log_level: var("KM_LOG_LEVEL")
                .or_else(|| var("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            console_output: var("KM_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.console_output),

            json_logs: var("KM_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.json_logs),

            metrics_port: var("KM_METRICS_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.metrics_port),

            ..defaults
        }
    }

    /// Attach the board identity. A board with its debug switch on logs at
    /// `debug` unless a filter was set explicitly.
    #[must_use]
    pub fn for_board(mut self, board_id: &str, debug: bool) -> Self {
        self.board_id = board_id.to_string();
        self.service_name = format!("keymesh-{board_id}");
        if debug && self.log_level == "info" {
            self.log_level = "debug".to_string();
        }
        self
    }
}
