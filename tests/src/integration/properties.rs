//! # Exchange Properties Over the Wire
//!
//! One real board (`1234`) on a broker, with the peer played by the test:
//! requests are read off the request topics and responses are hand-built
//! envelopes routed through the board's `BusRouter`.

#[cfg(test)]
mod tests {
    use crate::integration::board_config;
    use bytes::Bytes;
    use km_02_correlation_tracker::TrackerError;
    use km_03_exchange_coordinator::{
        CoordinatorError, DropReason, RouteOutcome, SessionState, StepOutcome,
    };
    use node_runtime::adapters::StageBody;
    use node_runtime::KeyMeshContainer;
    use shared_bus::{InMemoryBroker, MessageTransport, Subscription, TransportMessage};
    use shared_types::{CorrelationId, Direction, ExchangeEnvelope, ExchangeKind, PeerId};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    const PEER: &str = "peerB";

    struct Harness {
        container: KeyMeshContainer,
        requests: Subscription,
    }

    impl Harness {
        fn new(max_retries: u32) -> Self {
            let broker = Arc::new(InMemoryBroker::new());
            let requests = broker.subscribe("+/+/request").unwrap();
            let mut config = board_config("1234", &[]);
            config.exchange.max_retries = max_retries;
            let transport: Arc<dyn MessageTransport> = broker;
            Self {
                container: KeyMeshContainer::with_transport(config, transport).unwrap(),
                requests,
            }
        }

        fn peer() -> PeerId {
            PeerId::from(PEER)
        }

        fn next_request(&mut self) -> (String, ExchangeEnvelope) {
            let message = self.requests.try_recv().unwrap().expect("request published");
            let envelope = ExchangeEnvelope::decode(&message.payload).unwrap();
            (message.topic, envelope)
        }

        fn answer_as(&self, request: &ExchangeEnvelope, sender: &str) -> ExchangeEnvelope {
            let body = serde_json::to_vec(&StageBody {
                board_uid: sender.to_string(),
                board_name: format!("esp-{sender}"),
                stage: request.kind,
            })
            .unwrap();
            ExchangeEnvelope::response_to(request, PeerId::from(sender), body)
        }

        fn route(&self, envelope: &ExchangeEnvelope) -> RouteOutcome {
            let topic = self.container.registry.response_topic(envelope.kind);
            self.route_on(topic, Bytes::from(envelope.encode().unwrap()))
        }

        fn route_on(&self, topic: &str, payload: Bytes) -> RouteOutcome {
            self.container
                .router
                .route(&TransportMessage::new(topic.to_string(), payload))
        }

        fn state(&self) -> SessionState {
            self.container.coordinator.state(&Self::peer())
        }
    }

    #[test]
    fn test_stages_run_in_order_on_their_topics() {
        let mut h = Harness::new(2);
        h.container.coordinator.start(&Harness::peer()).unwrap();

        for (i, kind) in ExchangeKind::ALL.into_iter().enumerate() {
            let (topic, request) = h.next_request();
            assert_eq!(topic, h.container.registry.request_topic(kind));
            assert_eq!(request.kind, kind);
            assert_eq!(request.direction, Direction::Request);
            assert_eq!(request.sender, PeerId::from("1234"));
            assert_eq!(request.recipient, Harness::peer());
            assert_eq!(h.state(), SessionState::awaiting(kind));

            let outcome = h.route(&h.answer_as(&request, PEER));
            if i + 1 < ExchangeKind::ALL.len() {
                assert!(matches!(
                    outcome,
                    RouteOutcome::Response(StepOutcome::Advanced { completed, .. }) if completed == kind
                ));
            } else {
                assert_eq!(
                    outcome,
                    RouteOutcome::Response(StepOutcome::Completed {
                        peer_id: Harness::peer()
                    })
                );
            }
        }

        assert_eq!(h.state(), SessionState::Complete);
        assert!(h.requests.try_recv().unwrap().is_none());
    }

    #[test]
    fn test_timeout_at_cek_fails_and_late_response_is_ignored() {
        let mut h = Harness::new(0);
        h.container.coordinator.start(&Harness::peer()).unwrap();

        for _ in 0..2 {
            let (_, request) = h.next_request();
            h.route(&h.answer_as(&request, PEER));
        }
        let (_, cek_request) = h.next_request();
        assert_eq!(cek_request.kind, ExchangeKind::Cek);
        assert_eq!(h.state(), SessionState::AwaitingCek);

        let outcomes = h
            .container
            .coordinator
            .tick(Instant::now() + Duration::from_secs(10));
        assert_eq!(outcomes.len(), 1);
        assert_eq!(h.state(), SessionState::Failed);

        let late = h.route(&h.answer_as(&cek_request, PEER));
        assert_eq!(late, RouteOutcome::Response(StepOutcome::Ignored));
        assert_eq!(h.state(), SessionState::Failed);
        assert_eq!(h.container.tracker.stats().snapshot().unknown, 1);

        // Nothing further is requested of the failed peer.
        assert!(h.requests.try_recv().unwrap().is_none());
    }

    #[test]
    fn test_forged_correlation_changes_nothing() {
        let mut h = Harness::new(2);
        let issued = h.container.coordinator.start(&Harness::peer()).unwrap();
        let (_, request) = h.next_request();

        let forged = ExchangeEnvelope {
            correlation_id: CorrelationId::new(),
            ..h.answer_as(&request, PEER)
        };
        assert_eq!(h.route(&forged), RouteOutcome::Response(StepOutcome::Ignored));

        assert!(h.container.tracker.is_pending(&issued));
        assert_eq!(h.state(), SessionState::AwaitingPublicKey);
        assert_eq!(h.container.tracker.stats().snapshot().unknown, 1);
    }

    #[test]
    fn test_response_from_wrong_board_is_unknown() {
        let mut h = Harness::new(2);
        let issued = h.container.coordinator.start(&Harness::peer()).unwrap();
        let (_, request) = h.next_request();

        let impostor = h.route(&h.answer_as(&request, "peerC"));
        assert_eq!(impostor, RouteOutcome::Response(StepOutcome::Ignored));
        assert!(h.container.tracker.is_pending(&issued));

        let genuine = h.route(&h.answer_as(&request, PEER));
        assert!(matches!(
            genuine,
            RouteOutcome::Response(StepOutcome::Advanced { .. })
        ));
        assert_eq!(h.state(), SessionState::AwaitingSignature);
    }

    #[test]
    fn test_responses_for_other_boards_are_not_counted() {
        let mut h = Harness::new(2);
        h.container.coordinator.start(&Harness::peer()).unwrap();
        let (_, request) = h.next_request();

        let mut elsewhere = h.answer_as(&request, PEER);
        elsewhere.recipient = PeerId::from("5678");
        assert_eq!(
            h.route(&elsewhere),
            RouteOutcome::Dropped(DropReason::NotAddressed)
        );
        assert_eq!(h.container.tracker.stats().snapshot().unknown, 0);
        assert_eq!(h.container.tracker.pending_count(), 1);
    }

    #[test]
    fn test_bad_payloads_and_topics_are_dropped() {
        let mut h = Harness::new(2);
        h.container.coordinator.start(&Harness::peer()).unwrap();
        let (_, request) = h.next_request();
        let response = h.answer_as(&request, PEER);

        let on_wrong_topic = h.route_on(
            h.container.registry.response_topic(ExchangeKind::Signature),
            Bytes::from(response.encode().unwrap()),
        );
        assert_eq!(
            on_wrong_topic,
            RouteOutcome::Dropped(DropReason::TopicMismatch {
                topic_kind: ExchangeKind::Signature,
                envelope_kind: ExchangeKind::PublicKey,
            })
        );

        assert!(matches!(
            h.route_on(
                h.container.registry.response_topic(ExchangeKind::PublicKey),
                Bytes::from_static(b"{not json")
            ),
            RouteOutcome::Dropped(DropReason::Malformed(_))
        ));

        assert_eq!(
            h.route_on("/unrelated/topic", Bytes::from(response.encode().unwrap())),
            RouteOutcome::Dropped(DropReason::UnknownTopic)
        );

        assert_eq!(h.state(), SessionState::AwaitingPublicKey);
        assert_eq!(h.container.tracker.pending_count(), 1);
    }

    #[test]
    fn test_second_issue_for_same_peer_and_kind_is_rejected() {
        let h = Harness::new(2);
        let peer = Harness::peer();
        let first = h.container.coordinator.start(&peer).unwrap();

        assert!(matches!(
            h.container.coordinator.start(&peer),
            Err(CoordinatorError::SessionInProgress { .. })
        ));
        assert_eq!(
            h.container.tracker.issue(
                ExchangeKind::PublicKey,
                &peer,
                Duration::from_secs(1),
                Vec::new()
            ),
            Err(TrackerError::DuplicateInFlight {
                peer_id: peer.clone(),
                kind: ExchangeKind::PublicKey,
                existing: first,
            })
        );
        assert_eq!(h.container.tracker.pending_count(), 1);
    }

    #[test]
    fn test_requests_from_peers_are_answered() {
        let h = Harness::new(2);
        let request = ExchangeEnvelope::request(
            CorrelationId::new(),
            ExchangeKind::DistributedPack,
            Harness::peer(),
            PeerId::from("1234"),
            Vec::new(),
        );
        let topic = h.container.registry.request_topic(ExchangeKind::DistributedPack);
        let outcome = h.route_on(topic, Bytes::from(request.encode().unwrap()));
        assert!(matches!(
            outcome,
            RouteOutcome::Request(km_03_exchange_coordinator::ResponderOutcome::Answered {
                correlation_id,
                ..
            }) if correlation_id == request.correlation_id
        ));
    }
}
