//! Exchange sessions and step outcomes.

use crate::domain::SessionState;
use shared_types::{CorrelationId, ExchangeKind, PeerId};
use std::fmt;
use std::time::{Duration, Instant};

/// A stage the session has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedStage {
    pub kind: ExchangeKind,
    pub correlation_id: CorrelationId,
    pub completed_at: Instant,
    pub round_trip: Duration,
    pub attempts: u32,
}

/// Why a session ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The awaited stage ran out of retries.
    TimedOut { kind: ExchangeKind, attempts: u32 },
    /// The next stage's request could not be issued.
    IssueFailed { kind: ExchangeKind, reason: String },
    /// The payload port refused a stage body.
    PayloadRejected { kind: ExchangeKind, reason: String },
}

impl FailureReason {
    /// The stage the session failed at.
    #[must_use]
    pub fn kind(&self) -> ExchangeKind {
        match self {
            FailureReason::TimedOut { kind, .. }
            | FailureReason::IssueFailed { kind, .. }
            | FailureReason::PayloadRejected { kind, .. } => *kind,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::TimedOut { kind, attempts } => {
                write!(f, "{kind} timed out after {attempts} attempt(s)")
            }
            FailureReason::IssueFailed { kind, reason } => {
                write!(f, "could not issue {kind} request: {reason}")
            }
            FailureReason::PayloadRejected { kind, reason } => {
                write!(f, "{kind} payload rejected: {reason}")
            }
        }
    }
}

/// One peer's run through the exchange sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeSession {
    pub peer_id: PeerId,
    pub state: SessionState,
    pub started_at: Instant,
    pub updated_at: Instant,
    /// Correlation id of the request for the awaited stage.
    pub pending: Option<CorrelationId>,
    /// Finished stages, in order.
    pub history: Vec<CompletedStage>,
    pub failure: Option<FailureReason>,
}

impl ExchangeSession {
    /// A session that has just issued its first request.
    pub(crate) fn started(peer_id: PeerId, correlation_id: CorrelationId, now: Instant) -> Self {
        Self {
            peer_id,
            state: SessionState::awaiting(ExchangeKind::FIRST),
            started_at: now,
            updated_at: now,
            pending: Some(correlation_id),
            history: Vec::new(),
            failure: None,
        }
    }

    /// Whether a response or timeout for (`kind`, `correlation_id`) is the
    /// one this session is waiting for.
    #[must_use]
    pub fn expects(&self, kind: ExchangeKind, correlation_id: CorrelationId) -> bool {
        self.state.awaited_kind() == Some(kind) && self.pending == Some(correlation_id)
    }

    pub(crate) fn complete_stage(&mut self, stage: CompletedStage) {
        self.updated_at = stage.completed_at;
        self.pending = None;
        self.history.push(stage);
    }

    pub(crate) fn await_stage(&mut self, kind: ExchangeKind, correlation_id: CorrelationId) {
        self.state = SessionState::awaiting(kind);
        self.pending = Some(correlation_id);
    }

    pub(crate) fn finish(&mut self, now: Instant) {
        self.state = SessionState::Complete;
        self.pending = None;
        self.updated_at = now;
    }

    pub(crate) fn fail(&mut self, reason: FailureReason, now: Instant) {
        self.state = SessionState::Failed;
        self.pending = None;
        self.failure = Some(reason);
        self.updated_at = now;
    }

    /// Stages completed so far.
    #[must_use]
    pub fn completed_kinds(&self) -> Vec<ExchangeKind> {
        self.history.iter().map(|s| s.kind).collect()
    }
}

/// What a coordinator step did to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Stage done, next stage's request issued.
    Advanced {
        peer_id: PeerId,
        completed: ExchangeKind,
        next: ExchangeKind,
        correlation_id: CorrelationId,
    },
    /// Final stage done.
    Completed { peer_id: PeerId },
    /// Session moved to `Failed`.
    Failed {
        peer_id: PeerId,
        reason: FailureReason,
    },
    /// Nothing changed.
    Ignored,
}

impl StepOutcome {
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        matches!(self, StepOutcome::Ignored)
    }
}
