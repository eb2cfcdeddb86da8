//! Outbound Ports (Driven Ports)
//!
//! The coordinator treats stage bodies as opaque bytes. Whatever produces
//! keys, signatures and CEKs plugs in behind [`StagePayloads`].

use crate::domain::FailureReason;
use crate::error::PayloadError;
use km_02_correlation_tracker::{ExchangeTimedOut, Resolution, RetryAttempt};
use parking_lot::Mutex;
use shared_types::{CorrelationId, ExchangeKind, PeerId};

/// Source and sink of stage payload bodies.
pub trait StagePayloads: Send + Sync {
    /// Body of the `kind` request sent to `peer_id`.
    fn request_body(&self, peer_id: &PeerId, kind: ExchangeKind) -> Result<Vec<u8>, PayloadError>;

    /// Accept the body of `peer_id`'s `kind` response. An error fails the
    /// session.
    fn consume_response(
        &self,
        peer_id: &PeerId,
        kind: ExchangeKind,
        body: &[u8],
    ) -> Result<(), PayloadError>;

    /// Body answering `requester`'s `kind` request.
    fn respond(
        &self,
        requester: &PeerId,
        kind: ExchangeKind,
        request_body: &[u8],
    ) -> Result<Vec<u8>, PayloadError>;
}

/// Fixed payloads of the form `<kind>:<board>`. Received response bodies are
/// kept for inspection.
#[derive(Debug)]
pub struct StaticPayloads {
    local_peer: PeerId,
    received: Mutex<Vec<(PeerId, ExchangeKind, Vec<u8>)>>,
}

impl StaticPayloads {
    pub fn new(local_peer: impl Into<PeerId>) -> Self {
        Self {
            local_peer: local_peer.into(),
            received: Mutex::new(Vec::new()),
        }
    }

    /// The body this board sends for `kind`, as a request or a response.
    #[must_use]
    pub fn body_for(&self, kind: ExchangeKind) -> Vec<u8> {
        format!("{kind}:{}", self.local_peer).into_bytes()
    }

    /// Response bodies consumed so far, in arrival order.
    pub fn received(&self) -> Vec<(PeerId, ExchangeKind, Vec<u8>)> {
        self.received.lock().clone()
    }
}

impl StagePayloads for StaticPayloads {
    fn request_body(&self, _peer_id: &PeerId, kind: ExchangeKind) -> Result<Vec<u8>, PayloadError> {
        Ok(self.body_for(kind))
    }

    fn consume_response(
        &self,
        peer_id: &PeerId,
        kind: ExchangeKind,
        body: &[u8],
    ) -> Result<(), PayloadError> {
        self.received
            .lock()
            .push((peer_id.clone(), kind, body.to_vec()));
        Ok(())
    }

    fn respond(
        &self,
        _requester: &PeerId,
        kind: ExchangeKind,
        _request_body: &[u8],
    ) -> Result<Vec<u8>, PayloadError> {
        Ok(self.body_for(kind))
    }
}

/// Hooks for exchange activity. Every method defaults to doing nothing.
///
/// Called synchronously from coordinator, responder and router; keep
/// implementations cheap.
pub trait ExchangeObserver: Send + Sync {
    fn request_issued(&self, _peer_id: &PeerId, _kind: ExchangeKind) {}
    fn request_retried(&self, _retry: &RetryAttempt) {}
    fn request_timed_out(&self, _timeout: &ExchangeTimedOut) {}
    fn response_resolved(&self, _resolution: &Resolution) {}
    fn unknown_response(&self, _correlation_id: CorrelationId) {}
    fn request_answered(&self, _requester: &PeerId, _kind: ExchangeKind) {}
    fn session_started(&self, _peer_id: &PeerId) {}
    fn session_completed(&self, _peer_id: &PeerId) {}
    fn session_failed(&self, _peer_id: &PeerId, _reason: &FailureReason) {}
    fn message_received(&self, _topic: &str) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ExchangeObserver for NoopObserver {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_payloads_bodies_name_kind_and_board() {
        let payloads = StaticPayloads::new("1234");
        let peer = PeerId::from("peerA");
        assert_eq!(
            payloads.request_body(&peer, ExchangeKind::Cek).unwrap(),
            b"cek:1234".to_vec()
        );
        assert_eq!(
            payloads
                .respond(&peer, ExchangeKind::PublicKey, b"ignored")
                .unwrap(),
            b"public_key:1234".to_vec()
        );
    }

    #[test]
    fn test_static_payloads_records_responses() {
        let payloads = StaticPayloads::new("1234");
        let peer = PeerId::from("peerA");
        payloads
            .consume_response(&peer, ExchangeKind::Signature, b"sig")
            .unwrap();
        assert_eq!(
            payloads.received(),
            vec![(peer, ExchangeKind::Signature, b"sig".to_vec())]
        );
    }
}
