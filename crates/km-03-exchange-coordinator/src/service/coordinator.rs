//! Exchange Coordinator - per-peer stage state machine.

use crate::domain::{
    CompletedStage, CoordinatorConfig, ExchangeSession, FailureReason, SessionState, StepOutcome,
};
use crate::error::CoordinatorError;
use crate::ports::{ExchangeObserver, NoopObserver, StagePayloads};
use km_02_correlation_tracker::{CorrelationTracker, ExchangeTimedOut, Resolution, TrackerError};
use parking_lot::Mutex;
use shared_types::{CorrelationId, ExchangeEnvelope, ExchangeKind, PeerId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Drives every peer's session through the exchange stages.
///
/// The session map is locked for the whole of each operation, including the
/// tracker call that issues the next stage, so a session's state and its
/// pending correlation id always change together.
pub struct ExchangeCoordinator {
    config: CoordinatorConfig,
    tracker: Arc<CorrelationTracker>,
    payloads: Arc<dyn StagePayloads>,
    observer: Arc<dyn ExchangeObserver>,
    sessions: Mutex<HashMap<PeerId, ExchangeSession>>,
}

impl ExchangeCoordinator {
    pub fn new(
        config: CoordinatorConfig,
        tracker: Arc<CorrelationTracker>,
        payloads: Arc<dyn StagePayloads>,
    ) -> Self {
        Self {
            config,
            tracker,
            payloads,
            observer: Arc::new(NoopObserver),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Report activity to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ExchangeObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn tracker(&self) -> &Arc<CorrelationTracker> {
        &self.tracker
    }

    /// Begin an exchange with `peer_id` by issuing its PublicKey request.
    ///
    /// A terminal session for the peer is replaced.
    ///
    /// # Errors
    ///
    /// - `SessionInProgress` - the peer's session is still awaiting a stage
    /// - `Tracker` - the request could not be issued (e.g. `DuplicateInFlight`
    ///   left behind by an abandoned session); no session is recorded
    /// - `Payload` - no PublicKey body available
    pub fn start(&self, peer_id: &PeerId) -> Result<CorrelationId, CoordinatorError> {
        let mut sessions = self.sessions.lock();

        if let Some(existing) = sessions.get(peer_id) {
            if existing.state.is_in_progress() {
                return Err(CoordinatorError::SessionInProgress {
                    peer_id: peer_id.clone(),
                    state: existing.state,
                });
            }
        }

        let kind = ExchangeKind::FIRST;
        let body = self.payloads.request_body(peer_id, kind)?;
        let correlation_id = self
            .tracker
            .issue(kind, peer_id, self.config.request_timeout, body)?;

        sessions.insert(
            peer_id.clone(),
            ExchangeSession::started(peer_id.clone(), correlation_id, Instant::now()),
        );

        self.observer.session_started(peer_id);
        self.observer.request_issued(peer_id, kind);
        info!(
            peer_id = %peer_id,
            correlation_id = %correlation_id,
            "Exchange session started"
        );

        Ok(correlation_id)
    }

    /// Apply a resolved response to its peer's session.
    ///
    /// Only a resolution for the awaited stage, under the correlation id the
    /// session issued, advances it. Everything else is ignored.
    pub fn on_resolved(&self, resolution: Resolution) -> StepOutcome {
        self.observer.response_resolved(&resolution);

        let mut sessions = self.sessions.lock();

        let Some(session) = sessions.get_mut(&resolution.peer_id) else {
            debug!(
                peer_id = %resolution.peer_id,
                kind = %resolution.kind,
                "Resolution for peer without a session, ignoring"
            );
            return StepOutcome::Ignored;
        };

        if !session.expects(resolution.kind, resolution.correlation_id) {
            debug!(
                peer_id = %resolution.peer_id,
                kind = %resolution.kind,
                state = %session.state,
                "Resolution for a stage the session is not awaiting, ignoring"
            );
            return StepOutcome::Ignored;
        }

        let peer_id = resolution.peer_id.clone();
        let kind = resolution.kind;
        let now = Instant::now();

        if let Err(e) = self
            .payloads
            .consume_response(&peer_id, kind, &resolution.body)
        {
            return self.fail(
                session,
                FailureReason::PayloadRejected {
                    kind,
                    reason: e.to_string(),
                },
                now,
            );
        }

        session.complete_stage(CompletedStage {
            kind,
            correlation_id: resolution.correlation_id,
            completed_at: now,
            round_trip: resolution.round_trip,
            attempts: resolution.attempts,
        });

        let Some(next) = kind.next() else {
            session.finish(now);
            self.observer.session_completed(&peer_id);
            info!(peer_id = %peer_id, "Exchange session complete");
            return StepOutcome::Completed { peer_id };
        };

        let issued = self
            .payloads
            .request_body(&peer_id, next)
            .map_err(CoordinatorError::from)
            .and_then(|body| {
                self.tracker
                    .issue(next, &peer_id, self.config.request_timeout, body)
                    .map_err(CoordinatorError::from)
            });

        match issued {
            Ok(correlation_id) => {
                session.await_stage(next, correlation_id);
                self.observer.request_issued(&peer_id, next);
                debug!(
                    peer_id = %peer_id,
                    completed = %kind,
                    next = %next,
                    correlation_id = %correlation_id,
                    "Exchange stage advanced"
                );
                StepOutcome::Advanced {
                    peer_id,
                    completed: kind,
                    next,
                    correlation_id,
                }
            }
            Err(e) => self.fail(
                session,
                FailureReason::IssueFailed {
                    kind: next,
                    reason: e.to_string(),
                },
                now,
            ),
        }
    }

    /// Resolve a response envelope against the tracker and apply it.
    ///
    /// Responses the tracker does not know (stale, duplicate, forged) are
    /// dropped.
    pub fn handle_response(&self, envelope: ExchangeEnvelope) -> StepOutcome {
        let correlation_id = envelope.correlation_id;
        let sender = envelope.sender.clone();

        match self.tracker.resolve_envelope(envelope) {
            Ok(resolution) => self.on_resolved(resolution),
            Err(TrackerError::UnknownCorrelation(_)) => {
                self.observer.unknown_response(correlation_id);
                debug!(
                    correlation_id = %correlation_id,
                    sender = %sender,
                    "Dropping response with unknown correlation ID"
                );
                StepOutcome::Ignored
            }
            Err(e) => {
                warn!(correlation_id = %correlation_id, error = %e, "Failed to resolve response");
                StepOutcome::Ignored
            }
        }
    }

    /// Apply a tracker timeout. Fails the session if it was waiting on
    /// exactly this request.
    pub fn on_timeout(&self, timeout: &ExchangeTimedOut) -> StepOutcome {
        let mut sessions = self.sessions.lock();

        match sessions.get_mut(&timeout.peer_id) {
            Some(session) if session.expects(timeout.kind, timeout.correlation_id) => self.fail(
                session,
                FailureReason::TimedOut {
                    kind: timeout.kind,
                    attempts: timeout.attempts,
                },
                Instant::now(),
            ),
            _ => {
                debug!(
                    peer_id = %timeout.peer_id,
                    kind = %timeout.kind,
                    correlation_id = %timeout.correlation_id,
                    "Timeout for a request no session is waiting on"
                );
                StepOutcome::Ignored
            }
        }
    }

    /// Drive the tracker's timers at `now` and apply every timeout.
    ///
    /// Returns the outcome of each timeout, ignored ones included.
    pub fn tick(&self, now: Instant) -> Vec<StepOutcome> {
        let report = self.tracker.tick(now);

        for retry in &report.retried {
            self.observer.request_retried(retry);
        }

        report
            .timed_out
            .iter()
            .map(|timeout| {
                self.observer.request_timed_out(timeout);
                self.on_timeout(timeout)
            })
            .collect()
    }

    /// Forget `peer_id`'s session. An in-flight request is left to expire.
    pub fn abandon(&self, peer_id: &PeerId) -> Option<ExchangeSession> {
        let removed = self.sessions.lock().remove(peer_id);
        if let Some(session) = &removed {
            info!(peer_id = %peer_id, state = %session.state, "Exchange session abandoned");
        }
        removed
    }

    /// Current state of `peer_id`'s session; `Idle` if there is none.
    pub fn state(&self, peer_id: &PeerId) -> SessionState {
        self.sessions
            .lock()
            .get(peer_id)
            .map_or(SessionState::Idle, |s| s.state)
    }

    /// Snapshot of `peer_id`'s session.
    pub fn session(&self, peer_id: &PeerId) -> Option<ExchangeSession> {
        self.sessions.lock().get(peer_id).cloned()
    }

    /// Peers whose sessions are still awaiting a stage.
    pub fn active_sessions(&self) -> Vec<PeerId> {
        let mut peers: Vec<PeerId> = self
            .sessions
            .lock()
            .values()
            .filter(|s| s.state.is_in_progress())
            .map(|s| s.peer_id.clone())
            .collect();
        peers.sort();
        peers
    }

    /// Number of sessions held, terminal ones included.
    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    fn fail(
        &self,
        session: &mut ExchangeSession,
        reason: FailureReason,
        now: Instant,
    ) -> StepOutcome {
        warn!(
            peer_id = %session.peer_id,
            state = %session.state,
            reason = %reason,
            "Exchange session failed"
        );
        session.fail(reason.clone(), now);
        self.observer.session_failed(&session.peer_id, &reason);
        StepOutcome::Failed {
            peer_id: session.peer_id.clone(),
            reason,
        }
    }
}
