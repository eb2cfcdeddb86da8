//! # Two Boards, One Broker
//!
//! Full four-stage exchanges between `NodeRuntime`s sharing an in-process
//! broker: the requester's coordinator drives the stages, the peer's
//! responder answers them, and both bus routers filter by recipient.

#[cfg(test)]
mod tests {
    use crate::integration::{board, eventually, state_of};
    use km_03_exchange_coordinator::{FailureReason, SessionState};
    use shared_bus::InMemoryBroker;
    use shared_types::{ExchangeKind, PeerId};
    use std::sync::Arc;
    use std::time::Duration;

    const LIMIT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_requester_completes_all_four_stages() {
        let broker = Arc::new(InMemoryBroker::new());
        let responder = board(&broker, "B", &[]);
        responder.start().await.unwrap();

        let requester = board(&broker, "A", &["B"]);
        requester.start().await.unwrap();
        let a = requester.container();

        assert!(eventually(LIMIT, || state_of(&a, "B") == "complete").await);

        let session = a.coordinator.session(&PeerId::from("B")).unwrap();
        assert_eq!(session.completed_kinds(), ExchangeKind::ALL.to_vec());
        assert_eq!(session.pending, None);
        assert_eq!(a.tracker.pending_count(), 0);

        for kind in ExchangeKind::ALL {
            let body = a.payloads.received(&PeerId::from("B"), kind).unwrap();
            assert_eq!(body.board_uid, "B");
            assert_eq!(body.board_name, "esp-B");
            assert_eq!(body.stage, kind);
        }

        // The responder keeps no session for a peer it only answered.
        assert_eq!(state_of(&responder.container(), "A"), "idle");

        requester.shutdown().await;
        responder.shutdown().await;
    }

    #[tokio::test]
    async fn test_mutual_exchange_recovers_lost_first_request() {
        let broker = Arc::new(InMemoryBroker::new());

        // B asks A before A is listening; the first request is lost and only
        // the retry is answered.
        let b = board(&broker, "B", &["A"]);
        b.start().await.unwrap();
        let a = board(&broker, "A", &["B"]);
        a.start().await.unwrap();

        let (ca, cb) = (a.container(), b.container());
        assert!(
            eventually(LIMIT, || {
                state_of(&ca, "B") == "complete" && state_of(&cb, "A") == "complete"
            })
            .await
        );

        let b_side = cb.coordinator.session(&PeerId::from("A")).unwrap();
        assert!(b_side.history[0].attempts >= 2);
        assert!(cb.tracker.stats().snapshot().retries >= 1);
        assert_eq!(cb.tracker.stats().snapshot().timeouts, 0);

        a.shutdown().await;
        b.shutdown().await;
    }

    #[tokio::test]
    async fn test_silent_peer_times_out_after_retries() {
        let broker = Arc::new(InMemoryBroker::new());
        let runtime = board(&broker, "A", &["ghost"]);
        runtime.start().await.unwrap();
        let a = runtime.container();

        assert!(eventually(LIMIT, || state_of(&a, "ghost") == "failed").await);

        let session = a.coordinator.session(&PeerId::from("ghost")).unwrap();
        assert_eq!(
            session.failure,
            Some(FailureReason::TimedOut {
                kind: ExchangeKind::PublicKey,
                attempts: 4,
            })
        );
        assert!(session.history.is_empty());

        let stats = a.tracker.stats().snapshot();
        assert_eq!(stats.retries, 3);
        assert_eq!(stats.timeouts, 1);
        assert_eq!(a.tracker.pending_count(), 0);

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_bystander_board_is_not_involved() {
        let broker = Arc::new(InMemoryBroker::new());
        let b = board(&broker, "B", &[]);
        let c = board(&broker, "C", &[]);
        b.start().await.unwrap();
        c.start().await.unwrap();

        let a = board(&broker, "A", &["B"]);
        a.start().await.unwrap();
        let ca = a.container();
        assert!(eventually(LIMIT, || state_of(&ca, "B") == "complete").await);

        let cc = c.container();
        assert_eq!(cc.coordinator.session_count(), 0);
        assert_eq!(cc.tracker.stats().snapshot().unknown, 0);

        for runtime in [&a, &b, &c] {
            runtime.shutdown().await;
        }
    }

    #[tokio::test]
    async fn test_restart_after_completion_runs_again() {
        let broker = Arc::new(InMemoryBroker::new());
        let b = board(&broker, "B", &[]);
        b.start().await.unwrap();
        let a = board(&broker, "A", &["B"]);
        a.start().await.unwrap();
        let ca = a.container();
        assert!(eventually(LIMIT, || state_of(&ca, "B") == "complete").await);

        ca.coordinator.start(&PeerId::from("B")).unwrap();
        assert_eq!(
            ca.coordinator.state(&PeerId::from("B")),
            SessionState::AwaitingPublicKey
        );
        assert!(eventually(LIMIT, || state_of(&ca, "B") == "complete").await);
        assert_eq!(ca.tracker.stats().snapshot().resolved, 8);

        a.shutdown().await;
        b.shutdown().await;
    }

    #[tokio::test]
    async fn test_stopped_responder_leaves_requester_failed() {
        let broker = Arc::new(InMemoryBroker::new());
        let b = board(&broker, "B", &[]);
        b.start().await.unwrap();
        b.shutdown().await;

        let a = board(&broker, "A", &["B"]);
        a.start().await.unwrap();
        let ca = a.container();
        assert!(eventually(LIMIT, || state_of(&ca, "B") == "failed").await);

        a.shutdown().await;
    }
}
