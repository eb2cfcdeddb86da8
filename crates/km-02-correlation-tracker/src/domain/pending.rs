//! A single in-flight request.

use bytes::Bytes;
use shared_types::{CorrelationId, ExchangeKind, PeerId};
use std::time::{Duration, Instant};

/// One in-flight request, owned exclusively by the tracker.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub correlation_id: CorrelationId,
    pub kind: ExchangeKind,
    pub peer_id: PeerId,
    /// When the request was first published.
    pub issued_at: Instant,
    /// When the current attempt expires.
    pub deadline: Instant,
    /// Per-attempt timeout, reused to extend the deadline on retry.
    pub timeout: Duration,
    pub retries_remaining: u32,
    /// Publishes made so far.
    pub attempts: u32,
    /// Request topic, kept for re-publishing.
    pub topic: String,
    /// Encoded request envelope, kept for re-publishing.
    pub payload: Bytes,
}

impl PendingRequest {
    /// Whether the current attempt has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    /// Consume one retry and move the deadline to `now + timeout`.
    ///
    /// Returns `false` (and changes nothing) when no retries remain.
    pub fn consume_retry(&mut self, now: Instant) -> bool {
        if self.retries_remaining == 0 {
            return false;
        }
        self.retries_remaining -= 1;
        self.attempts += 1;
        self.deadline = now + self.timeout;
        true
    }
}
