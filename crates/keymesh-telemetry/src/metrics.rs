//! Prometheus metrics for KeyMesh nodes.
//!
//! All metrics follow the naming convention: `km_<area>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: monotonically increasing (e.g. `km_exchange_requests_issued_total`)
//! - **Gauge**: goes up and down (e.g. `km_exchange_pending_requests`)
//! - **Histogram**: distribution (e.g. `km_exchange_round_trip_seconds`)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec,
    IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // CORRELATION TRACKER
    // =========================================================================

    /// Requests published, by exchange kind
    pub static ref REQUESTS_ISSUED: IntCounterVec = IntCounterVec::new(
        Opts::new("km_exchange_requests_issued_total", "Exchange requests issued"),
        &["kind"]
    ).expect("metric creation failed");

    /// Expired requests re-published
    pub static ref REQUEST_RETRIES: IntCounterVec = IntCounterVec::new(
        Opts::new("km_exchange_request_retries_total", "Expired exchange requests re-published"),
        &["kind"]
    ).expect("metric creation failed");

    /// Requests that ran out of retries
    pub static ref REQUEST_TIMEOUTS: IntCounterVec = IntCounterVec::new(
        Opts::new("km_exchange_request_timeouts_total", "Exchange requests timed out"),
        &["kind"]
    ).expect("metric creation failed");

    /// Responses matched to a pending request
    pub static ref RESPONSES_RESOLVED: IntCounterVec = IntCounterVec::new(
        Opts::new("km_exchange_responses_resolved_total", "Responses matched to pending requests"),
        &["kind"]
    ).expect("metric creation failed");

    /// Responses with no matching pending request (stale, duplicate, forged)
    pub static ref UNKNOWN_CORRELATIONS: IntCounter = IntCounter::new(
        "km_exchange_unknown_correlations_total",
        "Responses dropped for an unknown correlation id"
    ).expect("metric creation failed");

    /// Requests currently pending
    pub static ref PENDING_REQUESTS: IntGauge = IntGauge::new(
        "km_exchange_pending_requests",
        "Exchange requests awaiting a response"
    ).expect("metric creation failed");

    /// Issue-to-resolve latency
    pub static ref EXCHANGE_ROUND_TRIP: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "km_exchange_round_trip_seconds",
            "Time from first publish of a request to its response"
        ).buckets(exponential_buckets(0.001, 2.0, 15).expect("valid bucket layout")),
        &["kind"]
    ).expect("metric creation failed");

    // =========================================================================
    // EXCHANGE COORDINATOR
    // =========================================================================

    pub static ref SESSIONS_STARTED: IntCounter = IntCounter::new(
        "km_sessions_started_total",
        "Exchange sessions started"
    ).expect("metric creation failed");

    pub static ref SESSIONS_COMPLETED: IntCounter = IntCounter::new(
        "km_sessions_completed_total",
        "Exchange sessions that finished every stage"
    ).expect("metric creation failed");

    /// Failed sessions, by the stage they failed at
    pub static ref SESSIONS_FAILED: IntCounterVec = IntCounterVec::new(
        Opts::new("km_sessions_failed_total", "Exchange sessions failed"),
        &["stage"]
    ).expect("metric creation failed");

    pub static ref ACTIVE_SESSIONS: IntGauge = IntGauge::new(
        "km_sessions_active",
        "Exchange sessions awaiting a stage"
    ).expect("metric creation failed");

    // =========================================================================
    // RESPONDER AND BUS
    // =========================================================================

    /// Peer requests this board answered
    pub static ref REQUESTS_ANSWERED: IntCounterVec = IntCounterVec::new(
        Opts::new("km_responder_requests_answered_total", "Peer exchange requests answered"),
        &["kind"]
    ).expect("metric creation failed");

    /// Messages delivered by the transport
    pub static ref BUS_MESSAGES_RECEIVED: IntCounterVec = IntCounterVec::new(
        Opts::new("km_bus_messages_received_total", "Messages received from the broker"),
        &["topic"]
    ).expect("metric creation failed");
}

/// Handle on the registry the metrics were registered with
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; already registered metrics are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Tracker
        Box::new(REQUESTS_ISSUED.clone()),
        Box::new(REQUEST_RETRIES.clone()),
        Box::new(REQUEST_TIMEOUTS.clone()),
        Box::new(RESPONSES_RESOLVED.clone()),
        Box::new(UNKNOWN_CORRELATIONS.clone()),
        Box::new(PENDING_REQUESTS.clone()),
        Box::new(EXCHANGE_ROUND_TRIP.clone()),
        // Coordinator
        Box::new(SESSIONS_STARTED.clone()),
        Box::new(SESSIONS_COMPLETED.clone()),
        Box::new(SESSIONS_FAILED.clone()),
        Box::new(ACTIVE_SESSIONS.clone()),
        // Responder and bus
        Box::new(REQUESTS_ANSWERED.clone()),
        Box::new(BUS_MESSAGES_RECEIVED.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
