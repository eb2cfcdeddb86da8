//! Bus adapter for the Exchange Coordinator
//!
//! Subscribes to the registry's response topics (and request topics when a
//! responder is attached), decodes each message and dispatches it:
//!
//! - response topic → [`ExchangeCoordinator::handle_response`]
//! - request topic → [`RequestResponder::handle_request`]
//!
//! Messages are only dispatched when the topic, the envelope's kind and its
//! direction all agree, and the envelope is addressed to this board.

use crate::domain::StepOutcome;
use crate::error::CoordinatorError;
use crate::ports::{ExchangeObserver, NoopObserver};
use crate::service::{ExchangeCoordinator, RequestResponder, ResponderOutcome};
use km_01_topic_registry::TopicRegistry;
use shared_bus::{MessageTransport, Subscription, TransportError, TransportMessage};
use shared_types::{Direction, ExchangeEnvelope, ExchangeKind};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Why a message was not dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Topic is not one of the registry's eight.
    UnknownTopic,
    /// Payload is not a valid envelope.
    Malformed(String),
    /// Envelope kind or direction disagrees with the topic it arrived on.
    TopicMismatch {
        topic_kind: ExchangeKind,
        envelope_kind: ExchangeKind,
    },
    /// Addressed to another board.
    NotAddressed,
    /// Request arrived but no responder is attached.
    NoResponder,
}

/// What routing one message did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Response(StepOutcome),
    Request(ResponderOutcome),
    Dropped(DropReason),
    Failed(CoordinatorError),
}

/// Routes transport messages to the coordinator and responder.
pub struct BusRouter {
    registry: Arc<TopicRegistry>,
    transport: Arc<dyn MessageTransport>,
    coordinator: Arc<ExchangeCoordinator>,
    responder: Option<Arc<RequestResponder>>,
    observer: Arc<dyn ExchangeObserver>,
}

impl BusRouter {
    pub fn new(
        registry: Arc<TopicRegistry>,
        transport: Arc<dyn MessageTransport>,
        coordinator: Arc<ExchangeCoordinator>,
    ) -> Self {
        Self {
            registry,
            transport,
            coordinator,
            responder: None,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Also answer requests addressed to this board.
    #[must_use]
    pub fn with_responder(mut self, responder: Arc<RequestResponder>) -> Self {
        self.responder = Some(responder);
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ExchangeObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Subscribe to every topic this router handles.
    ///
    /// Call before the first `start`, or early responses are lost.
    pub fn subscribe(&self) -> Result<Subscription, TransportError> {
        let mut filters: Vec<&str> = self.registry.response_topics().collect();
        if self.responder.is_some() {
            filters.extend(self.registry.request_topics());
        }
        self.transport.subscribe_many(&filters)
    }

    /// Decode and dispatch one message.
    pub fn route(&self, message: &TransportMessage) -> RouteOutcome {
        self.observer.message_received(&message.topic);

        let Some((topic_kind, topic_direction)) = self.registry.classify(&message.topic) else {
            debug!(topic = %message.topic, "Message on unregistered topic, dropping");
            return RouteOutcome::Dropped(DropReason::UnknownTopic);
        };

        let envelope = match ExchangeEnvelope::decode(&message.payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(topic = %message.topic, error = %e, "Malformed envelope, dropping");
                return RouteOutcome::Dropped(DropReason::Malformed(e.to_string()));
            }
        };

        if envelope.kind != topic_kind || envelope.direction != topic_direction {
            warn!(
                topic = %message.topic,
                correlation_id = %envelope.correlation_id,
                envelope_kind = %envelope.kind,
                "Envelope does not match its topic, dropping"
            );
            return RouteOutcome::Dropped(DropReason::TopicMismatch {
                topic_kind,
                envelope_kind: envelope.kind,
            });
        }

        match topic_direction {
            Direction::Response => {
                if !envelope.is_for(self.coordinator.tracker().local_peer()) {
                    return RouteOutcome::Dropped(DropReason::NotAddressed);
                }
                RouteOutcome::Response(self.coordinator.handle_response(envelope))
            }
            Direction::Request => {
                let Some(responder) = &self.responder else {
                    return RouteOutcome::Dropped(DropReason::NoResponder);
                };
                match responder.handle_request(&envelope) {
                    Ok(ResponderOutcome::NotAddressed) => {
                        RouteOutcome::Dropped(DropReason::NotAddressed)
                    }
                    Ok(outcome) => RouteOutcome::Request(outcome),
                    Err(e) => {
                        warn!(
                            correlation_id = %envelope.correlation_id,
                            kind = %envelope.kind,
                            error = %e,
                            "Failed to answer exchange request"
                        );
                        RouteOutcome::Failed(e)
                    }
                }
            }
        }
    }

    /// Route messages from `subscription` until it ends or `shutdown`
    /// flips to `true`.
    ///
    /// This should be spawned as a background task.
    pub async fn run(self: Arc<Self>, mut subscription: Subscription, mut shutdown: watch::Receiver<bool>) {
        info!(
            filters = subscription.filters().len(),
            "[BusRouter] Started listening for exchange messages"
        );

        loop {
            tokio::select! {
                message = subscription.recv() => match message {
                    Some(message) => {
                        self.route(&message);
                    }
                    None => {
                        warn!("[BusRouter] Subscription ended, shutting down");
                        break;
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("[BusRouter] Shutdown signal received");
                        break;
                    }
                }
            }
        }
    }
}
