//! Exchange activity to Prometheus.

use keymesh_telemetry::{
    BUS_MESSAGES_RECEIVED, EXCHANGE_ROUND_TRIP, REQUESTS_ANSWERED, REQUESTS_ISSUED,
    REQUEST_RETRIES, REQUEST_TIMEOUTS, RESPONSES_RESOLVED, SESSIONS_COMPLETED, SESSIONS_FAILED,
    SESSIONS_STARTED, UNKNOWN_CORRELATIONS,
};
use keymesh_telemetry::{metric_inc, metric_observe};
use km_02_correlation_tracker::{ExchangeTimedOut, Resolution, RetryAttempt};
use km_03_exchange_coordinator::{ExchangeObserver, FailureReason};
use shared_types::{CorrelationId, ExchangeKind, PeerId};

/// Records every observer hook in the global metrics registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsObserver;

impl ExchangeObserver for MetricsObserver {
    fn request_issued(&self, _peer_id: &PeerId, kind: ExchangeKind) {
        metric_inc!(REQUESTS_ISSUED, &[kind.as_str()]);
    }

    fn request_retried(&self, retry: &RetryAttempt) {
        metric_inc!(REQUEST_RETRIES, &[retry.kind.as_str()]);
    }

    fn request_timed_out(&self, timeout: &ExchangeTimedOut) {
        metric_inc!(REQUEST_TIMEOUTS, &[timeout.kind.as_str()]);
    }

    fn response_resolved(&self, resolution: &Resolution) {
        let kind = resolution.kind.as_str();
        metric_inc!(RESPONSES_RESOLVED, &[kind]);
        metric_observe!(
            EXCHANGE_ROUND_TRIP,
            &[kind],
            resolution.round_trip.as_secs_f64()
        );
    }

    fn unknown_response(&self, _correlation_id: CorrelationId) {
        metric_inc!(UNKNOWN_CORRELATIONS);
    }

    fn request_answered(&self, _requester: &PeerId, kind: ExchangeKind) {
        metric_inc!(REQUESTS_ANSWERED, &[kind.as_str()]);
    }

    fn session_started(&self, _peer_id: &PeerId) {
        metric_inc!(SESSIONS_STARTED);
    }

    fn session_completed(&self, _peer_id: &PeerId) {
        metric_inc!(SESSIONS_COMPLETED);
    }

    fn session_failed(&self, _peer_id: &PeerId, reason: &FailureReason) {
        metric_inc!(SESSIONS_FAILED, &[reason.kind().as_str()]);
    }

    fn message_received(&self, topic: &str) {
        metric_inc!(BUS_MESSAGES_RECEIVED, &[topic]);
    }
}
