//! Request Responder - answers exchanges initiated by peers.

use crate::error::CoordinatorError;
use crate::ports::{ExchangeObserver, NoopObserver, StagePayloads};
use bytes::Bytes;
use km_01_topic_registry::TopicRegistry;
use shared_bus::MessageTransport;
use shared_types::{CorrelationId, Direction, ExchangeEnvelope, ExchangeKind, PeerId};
use std::sync::Arc;
use tracing::{debug, trace};

/// Result of handling one request envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponderOutcome {
    /// Response published on the kind's response topic.
    Answered {
        correlation_id: CorrelationId,
        kind: ExchangeKind,
        requester: PeerId,
        receivers: usize,
    },
    /// Not a request addressed to this board.
    NotAddressed,
}

/// Answers requests addressed to the local board, echoing the correlation id.
///
/// Keeps no state: a re-delivered request (a peer's retry) is answered again.
pub struct RequestResponder {
    local_peer: PeerId,
    registry: Arc<TopicRegistry>,
    transport: Arc<dyn MessageTransport>,
    payloads: Arc<dyn StagePayloads>,
    observer: Arc<dyn ExchangeObserver>,
}

impl RequestResponder {
    pub fn new(
        local_peer: PeerId,
        registry: Arc<TopicRegistry>,
        transport: Arc<dyn MessageTransport>,
        payloads: Arc<dyn StagePayloads>,
    ) -> Self {
        Self {
            local_peer,
            registry,
            transport,
            payloads,
            observer: Arc::new(NoopObserver),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ExchangeObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn local_peer(&self) -> &PeerId {
        &self.local_peer
    }

    /// Answer `request` if it is a request addressed to this board.
    ///
    /// # Errors
    ///
    /// - `Payload` - no response body could be produced
    /// - `Envelope` / `Transport` - the response could not be encoded or
    ///   published
    pub fn handle_request(
        &self,
        request: &ExchangeEnvelope,
    ) -> Result<ResponderOutcome, CoordinatorError> {
        if request.direction != Direction::Request || !request.is_for(&self.local_peer) {
            trace!(
                correlation_id = %request.correlation_id,
                recipient = %request.recipient,
                "Request not addressed to this board"
            );
            return Ok(ResponderOutcome::NotAddressed);
        }

        let body = self
            .payloads
            .respond(&request.sender, request.kind, &request.body)?;
        let response = ExchangeEnvelope::response_to(request, self.local_peer.clone(), body);
        let payload = Bytes::from(response.encode()?);

        let topic = self.registry.response_topic(request.kind);
        let receivers = self.transport.publish(topic, payload)?;

        self.observer.request_answered(&request.sender, request.kind);
        debug!(
            correlation_id = %request.correlation_id,
            kind = %request.kind,
            requester = %request.sender,
            receivers = receivers,
            "Answered exchange request"
        );

        Ok(ResponderOutcome::Answered {
            correlation_id: request.correlation_id,
            kind: request.kind,
            requester: request.sender.clone(),
            receivers,
        })
    }
}
