//! Error types for the Correlation Tracker

use shared_bus::TransportError;
use shared_types::{CorrelationId, EnvelopeError, ExchangeKind, PeerId};
use thiserror::Error;

/// Errors that can occur in the Correlation Tracker
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// A request for this (peer, kind) is already in flight.
    #[error("Duplicate in-flight {kind} request for peer {peer_id} (pending {existing})")]
    DuplicateInFlight {
        peer_id: PeerId,
        kind: ExchangeKind,
        existing: CorrelationId,
    },

    /// No pending request matches; stale, duplicated or forged response.
    #[error("Unknown correlation id: {0}")]
    UnknownCorrelation(CorrelationId),

    #[error("Envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}
