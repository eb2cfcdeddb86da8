//! Error types for the Exchange Coordinator subsystem

use crate::domain::SessionState;
use km_02_correlation_tracker::TrackerError;
use shared_bus::TransportError;
use shared_types::{EnvelopeError, ExchangeKind, PeerId};
use thiserror::Error;

/// Errors returned by coordinator and responder operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("Exchange with {peer_id} already in progress ({state})")]
    SessionInProgress { peer_id: PeerId, state: SessionState },

    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),

    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),

    #[error("Envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Errors raised by a [`StagePayloads`](crate::ports::StagePayloads)
/// implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// No body can be produced for this stage right now.
    #[error("No {kind} payload available for {peer_id}: {reason}")]
    Unavailable {
        peer_id: PeerId,
        kind: ExchangeKind,
        reason: String,
    },

    /// A received body was not acceptable.
    #[error("Rejected {kind} payload from {peer_id}: {reason}")]
    Rejected {
        peer_id: PeerId,
        kind: ExchangeKind,
        reason: String,
    },
}
