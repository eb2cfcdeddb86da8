//! Correlation Tracker - pending exchange requests keyed by correlation id.

use crate::domain::{
    ExchangeTimedOut, PendingRequest, Resolution, RetryAttempt, TickReport, TrackerConfig,
};
use crate::error::TrackerError;
use bytes::Bytes;
use km_01_topic_registry::TopicRegistry;
use parking_lot::Mutex;
use shared_bus::MessageTransport;
use shared_types::{CorrelationId, Direction, ExchangeEnvelope, ExchangeKind, PeerId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Counters for tracker activity.
#[derive(Debug, Default)]
pub struct TrackerStats {
    pub total_issued: AtomicU64,
    pub total_resolved: AtomicU64,
    pub total_retries: AtomicU64,
    pub total_timeouts: AtomicU64,
    pub total_unknown: AtomicU64,
    pub total_cancelled: AtomicU64,
    pub total_duplicates_rejected: AtomicU64,
}

/// Point-in-time copy of [`TrackerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerStatsSnapshot {
    pub issued: u64,
    pub resolved: u64,
    pub retries: u64,
    pub timeouts: u64,
    pub unknown: u64,
    pub cancelled: u64,
    pub duplicates_rejected: u64,
}

impl TrackerStats {
    #[must_use]
    pub fn snapshot(&self) -> TrackerStatsSnapshot {
        TrackerStatsSnapshot {
            issued: self.total_issued.load(Ordering::Relaxed),
            resolved: self.total_resolved.load(Ordering::Relaxed),
            retries: self.total_retries.load(Ordering::Relaxed),
            timeouts: self.total_timeouts.load(Ordering::Relaxed),
            unknown: self.total_unknown.load(Ordering::Relaxed),
            cancelled: self.total_cancelled.load(Ordering::Relaxed),
            duplicates_rejected: self.total_duplicates_rejected.load(Ordering::Relaxed),
        }
    }
}

/// Pending collection plus its (peer, kind) index. Always mutated together.
#[derive(Default)]
struct TrackerState {
    pending: HashMap<CorrelationId, PendingRequest>,
    in_flight: HashMap<(PeerId, ExchangeKind), CorrelationId>,
}

impl TrackerState {
    fn remove(&mut self, correlation_id: &CorrelationId) -> Option<PendingRequest> {
        let request = self.pending.remove(correlation_id)?;
        self.in_flight
            .remove(&(request.peer_id.clone(), request.kind));
        Some(request)
    }
}

/// Tracks in-flight exchange requests and matches responses to them.
pub struct CorrelationTracker {
    config: TrackerConfig,
    registry: Arc<TopicRegistry>,
    transport: Arc<dyn MessageTransport>,
    state: Mutex<TrackerState>,
    stats: TrackerStats,
}

impl CorrelationTracker {
    pub fn new(
        config: TrackerConfig,
        registry: Arc<TopicRegistry>,
        transport: Arc<dyn MessageTransport>,
    ) -> Self {
        Self {
            config,
            registry,
            transport,
            state: Mutex::new(TrackerState::default()),
            stats: TrackerStats::default(),
        }
    }

    /// Board id this tracker sends as.
    #[must_use]
    pub fn local_peer(&self) -> &PeerId {
        &self.config.local_peer
    }

    /// Issue a `kind` request to `peer_id` carrying `body`.
    ///
    /// Registers the pending request with `deadline = now + timeout` and
    /// publishes it on the kind's request topic.
    ///
    /// # Errors
    ///
    /// - `TrackerError::DuplicateInFlight` - a `kind` request to `peer_id` is
    ///   still pending
    /// - `TrackerError::Transport` - publishing failed; nothing stays registered
    pub fn issue(
        &self,
        kind: ExchangeKind,
        peer_id: &PeerId,
        timeout: Duration,
        body: Vec<u8>,
    ) -> Result<CorrelationId, TrackerError> {
        let correlation_id = CorrelationId::new();
        let envelope = ExchangeEnvelope::request(
            correlation_id,
            kind,
            self.config.local_peer.clone(),
            peer_id.clone(),
            body,
        );
        let payload = Bytes::from(envelope.encode()?);
        let topic = self.registry.request_topic(kind).to_string();

        {
            let mut state = self.state.lock();
            let key = (peer_id.clone(), kind);

            if let Some(existing) = state.in_flight.get(&key) {
                self.stats
                    .total_duplicates_rejected
                    .fetch_add(1, Ordering::Relaxed);
                return Err(TrackerError::DuplicateInFlight {
                    peer_id: peer_id.clone(),
                    kind,
                    existing: *existing,
                });
            }

            let now = Instant::now();
            state.in_flight.insert(key, correlation_id);
            state.pending.insert(
                correlation_id,
                PendingRequest {
                    correlation_id,
                    kind,
                    peer_id: peer_id.clone(),
                    issued_at: now,
                    deadline: now + timeout,
                    timeout,
                    retries_remaining: self.config.max_retries,
                    attempts: 1,
                    topic: topic.clone(),
                    payload: payload.clone(),
                },
            );
        }

        if let Err(e) = self.transport.publish(&topic, payload) {
            self.state.lock().remove(&correlation_id);
            warn!(
                correlation_id = %correlation_id,
                peer_id = %peer_id,
                kind = %kind,
                error = %e,
                "Failed to publish exchange request"
            );
            return Err(e.into());
        }

        self.stats.total_issued.fetch_add(1, Ordering::Relaxed);
        debug!(
            correlation_id = %correlation_id,
            peer_id = %peer_id,
            kind = %kind,
            timeout_ms = timeout.as_millis(),
            "Issued exchange request"
        );

        Ok(correlation_id)
    }

    /// Match a response to its pending request and remove it.
    ///
    /// # Errors
    ///
    /// `TrackerError::UnknownCorrelation` if nothing is pending under
    /// `correlation_id`; state is left untouched.
    pub fn resolve(
        &self,
        correlation_id: CorrelationId,
        body: Vec<u8>,
    ) -> Result<Resolution, TrackerError> {
        self.resolve_matching(correlation_id, |_| true, body)
    }

    /// Like [`resolve`](Self::resolve), but only accepts the response if
    /// `sender` is the peer the request went to. A mismatch is treated as a
    /// forged response: `UnknownCorrelation`, no state change.
    pub fn resolve_from(
        &self,
        correlation_id: CorrelationId,
        sender: &PeerId,
        body: Vec<u8>,
    ) -> Result<Resolution, TrackerError> {
        self.resolve_matching(correlation_id, |p| &p.peer_id == sender, body)
    }

    /// Resolve from a decoded response envelope. Sender, kind and direction
    /// must all agree with the pending request.
    pub fn resolve_envelope(
        &self,
        envelope: ExchangeEnvelope,
    ) -> Result<Resolution, TrackerError> {
        let ExchangeEnvelope {
            correlation_id,
            kind,
            direction,
            sender,
            body,
            ..
        } = envelope;

        self.resolve_matching(
            correlation_id,
            |p| direction == Direction::Response && p.kind == kind && p.peer_id == sender,
            body,
        )
    }

    fn resolve_matching(
        &self,
        correlation_id: CorrelationId,
        accept: impl FnOnce(&PendingRequest) -> bool,
        body: Vec<u8>,
    ) -> Result<Resolution, TrackerError> {
        let removed = {
            let mut state = self.state.lock();
            let accepted = state.pending.get(&correlation_id).is_some_and(accept);
            if accepted {
                state.remove(&correlation_id)
            } else {
                None
            }
        };

        let Some(pending) = removed else {
            self.stats.total_unknown.fetch_add(1, Ordering::Relaxed);
            debug!(
                correlation_id = %correlation_id,
                "Response for unknown or expired correlation ID"
            );
            return Err(TrackerError::UnknownCorrelation(correlation_id));
        };

        let round_trip = pending.issued_at.elapsed();
        self.stats.total_resolved.fetch_add(1, Ordering::Relaxed);
        debug!(
            correlation_id = %correlation_id,
            peer_id = %pending.peer_id,
            kind = %pending.kind,
            attempts = pending.attempts,
            round_trip_ms = round_trip.as_millis(),
            "Resolved exchange request"
        );

        Ok(Resolution {
            correlation_id,
            kind: pending.kind,
            peer_id: pending.peer_id,
            body,
            round_trip,
            attempts: pending.attempts,
        })
    }

    /// Process expired requests at `now`.
    ///
    /// Each expired request is re-published with its deadline extended while
    /// retries remain; otherwise it is removed and reported as timed out.
    pub fn tick(&self, now: Instant) -> TickReport {
        let mut report = TickReport::default();
        let mut republish = Vec::new();

        {
            let mut state = self.state.lock();

            let mut expired: Vec<(Instant, CorrelationId)> = state
                .pending
                .values()
                .filter(|p| p.is_expired(now))
                .map(|p| (p.deadline, p.correlation_id))
                .collect();
            expired.sort();

            for (_, correlation_id) in expired {
                let Some(pending) = state.pending.get_mut(&correlation_id) else {
                    continue;
                };

                if pending.consume_retry(now) {
                    republish.push((pending.topic.clone(), pending.payload.clone()));
                    report.retried.push(RetryAttempt {
                        correlation_id,
                        peer_id: pending.peer_id.clone(),
                        kind: pending.kind,
                        retries_remaining: pending.retries_remaining,
                    });
                } else if let Some(pending) = state.remove(&correlation_id) {
                    report.timed_out.push(ExchangeTimedOut {
                        correlation_id,
                        peer_id: pending.peer_id,
                        kind: pending.kind,
                        attempts: pending.attempts,
                    });
                }
            }
        }

        for ((topic, payload), retry) in republish.into_iter().zip(&report.retried) {
            self.stats.total_retries.fetch_add(1, Ordering::Relaxed);
            match self.transport.publish(&topic, payload) {
                Ok(_) => debug!(
                    correlation_id = %retry.correlation_id,
                    peer_id = %retry.peer_id,
                    kind = %retry.kind,
                    retries_remaining = retry.retries_remaining,
                    "Re-published expired exchange request"
                ),
                // Left pending; it times out once the budget is spent
                Err(e) => warn!(
                    correlation_id = %retry.correlation_id,
                    error = %e,
                    "Failed to re-publish exchange request"
                ),
            }
        }

        for timed_out in &report.timed_out {
            self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
            info!(
                correlation_id = %timed_out.correlation_id,
                peer_id = %timed_out.peer_id,
                kind = %timed_out.kind,
                attempts = timed_out.attempts,
                "Exchange request timed out"
            );
        }

        report
    }

    /// Drop a pending request without reporting it.
    pub fn cancel(&self, correlation_id: &CorrelationId) -> bool {
        let removed = self.state.lock().remove(correlation_id).is_some();
        if removed {
            self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    /// Drop every pending request to `peer_id`. Returns how many were removed.
    pub fn cancel_peer(&self, peer_id: &PeerId) -> usize {
        let mut state = self.state.lock();
        let ids: Vec<CorrelationId> = state
            .pending
            .values()
            .filter(|p| &p.peer_id == peer_id)
            .map(|p| p.correlation_id)
            .collect();
        for id in &ids {
            state.remove(id);
        }
        self.stats
            .total_cancelled
            .fetch_add(ids.len() as u64, Ordering::Relaxed);
        ids.len()
    }

    /// Check if a correlation ID is pending
    pub fn is_pending(&self, correlation_id: &CorrelationId) -> bool {
        self.state.lock().pending.contains_key(correlation_id)
    }

    /// The pending request to `peer_id` for `kind`, if any.
    pub fn pending_for(&self, peer_id: &PeerId, kind: ExchangeKind) -> Option<CorrelationId> {
        self.state
            .lock()
            .in_flight
            .get(&(peer_id.clone(), kind))
            .copied()
    }

    /// Get number of currently pending requests
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Earliest deadline among pending requests.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.state.lock().pending.values().map(|p| p.deadline).min()
    }

    /// Get statistics
    pub fn stats(&self) -> &TrackerStats {
        &self.stats
    }
}
