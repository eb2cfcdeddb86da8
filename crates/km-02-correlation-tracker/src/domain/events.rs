//! Values reported by the tracker to its caller.

use shared_types::{CorrelationId, ExchangeKind, PeerId};
use std::time::Duration;

/// A response matched to its pending request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub correlation_id: CorrelationId,
    pub kind: ExchangeKind,
    pub peer_id: PeerId,
    /// Response body, handed on to whoever consumes the stage.
    pub body: Vec<u8>,
    /// Time from first publish to resolution.
    pub round_trip: Duration,
    /// Publishes made for this request (1 + retries used).
    pub attempts: u32,
}

/// A pending request expired with its retry budget exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeTimedOut {
    pub correlation_id: CorrelationId,
    pub peer_id: PeerId,
    pub kind: ExchangeKind,
    pub attempts: u32,
}

/// A pending request re-published by `tick`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryAttempt {
    pub correlation_id: CorrelationId,
    pub peer_id: PeerId,
    pub kind: ExchangeKind,
    /// Retries left after this one.
    pub retries_remaining: u32,
}

/// Everything one `tick` did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub retried: Vec<RetryAttempt>,
    pub timed_out: Vec<ExchangeTimedOut>,
}

impl TickReport {
    /// Whether the tick found nothing expired.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.retried.is_empty() && self.timed_out.is_empty()
    }
}
