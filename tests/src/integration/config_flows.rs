//! # Configuration Flows
//!
//! Environment-style configuration feeding real runtimes.

#[cfg(test)]
mod tests {
    use crate::integration::{eventually, state_of};
    use node_runtime::container::ConfigError;
    use node_runtime::{NodeConfig, NodeRuntime};
    use shared_bus::{InMemoryBroker, MessageTransport};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    fn config_from(pairs: &[(&str, &str)]) -> Result<NodeConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        NodeConfig::from_vars(|key| vars.get(key).cloned())
    }

    fn fast(uid: &str, peers: &str, extra: &[(&str, &str)]) -> NodeConfig {
        let mut pairs = vec![
            ("KM_BOARD_UID", uid),
            ("KM_PEERS", peers),
            ("KM_EXCHANGE_TIMEOUT_MS", "50"),
            ("KM_EXCHANGE_MAX_RETRIES", "1"),
            ("KM_TICK_INTERVAL_MS", "10"),
        ];
        pairs.extend_from_slice(extra);
        config_from(&pairs).unwrap()
    }

    const CUSTOM_TOPICS: [(&str, &str); 8] = [
        ("KM_TOPIC_PUBKEY_REQUEST", "lab/pk/req"),
        ("KM_TOPIC_PUBKEY_RESPONSE", "lab/pk/resp"),
        ("KM_TOPIC_SIGNATURE_REQUEST", "lab/sig/req"),
        ("KM_TOPIC_SIGNATURE_RESPONSE", "lab/sig/resp"),
        ("KM_TOPIC_CEK_REQUEST", "lab/cek/req"),
        ("KM_TOPIC_CEK_RESPONSE", "lab/cek/resp"),
        ("KM_TOPIC_PACK_REQUEST", "lab/pack/req"),
        ("KM_TOPIC_PACK_RESPONSE", "lab/pack/resp"),
    ];

    #[tokio::test]
    async fn test_boards_exchange_on_configured_topics() {
        let broker = Arc::new(InMemoryBroker::new());
        let mut spy = broker.subscribe("lab/#").unwrap();

        let transport: Arc<dyn MessageTransport> = broker.clone();
        let b = NodeRuntime::with_transport(fast("B", "", &CUSTOM_TOPICS), transport.clone())
            .unwrap();
        b.start().await.unwrap();
        let a = NodeRuntime::with_transport(fast("A", "B", &CUSTOM_TOPICS), transport).unwrap();
        a.start().await.unwrap();

        let ca = a.container();
        assert!(eventually(Duration::from_secs(5), || state_of(&ca, "B") == "complete").await);

        let mut seen = Vec::new();
        while let Ok(Some(message)) = spy.try_recv() {
            seen.push(message.topic);
        }
        assert!(seen.len() >= 8);
        assert!(seen.iter().all(|t| t.starts_with("lab/")));

        a.shutdown().await;
        b.shutdown().await;
    }

    #[tokio::test]
    async fn test_boards_on_different_topics_cannot_reach_each_other() {
        let broker = Arc::new(InMemoryBroker::new());
        let transport: Arc<dyn MessageTransport> = broker.clone();

        let b = NodeRuntime::with_transport(fast("B", "", &CUSTOM_TOPICS), transport.clone())
            .unwrap();
        b.start().await.unwrap();
        let a = NodeRuntime::with_transport(fast("A", "B", &[]), transport).unwrap();
        a.start().await.unwrap();

        let ca = a.container();
        assert!(eventually(Duration::from_secs(5), || state_of(&ca, "B") == "failed").await);

        a.shutdown().await;
        b.shutdown().await;
    }

    #[test]
    fn test_board_file_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.board.uid, "1234");
        assert_eq!(config.board.name, "myesp32");
        assert_eq!(config.broker.address, "broker.hivemq.com");
        assert_eq!(config.broker.port, 1883);
        assert_eq!(config.topics.public_key.request, "/pubKey/request");
        assert_eq!(config.topics.distributed_pack.response, "/distribuitedPack/response");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_runtime_refuses_bad_configuration() {
        let duplicate = config_from(&[
            ("KM_TOPIC_CEK_REQUEST", "/pubKey/request"),
        ])
        .unwrap();
        assert!(matches!(
            NodeRuntime::new(duplicate),
            Err(ConfigError::Topics(_))
        ));

        let own_peer = config_from(&[("KM_PEERS", "peerA, 1234")]).unwrap();
        assert!(matches!(
            NodeRuntime::new(own_peer),
            Err(ConfigError::SelfPeer(peer)) if peer == "1234"
        ));

        assert!(matches!(
            config_from(&[("KM_EXCHANGE_TIMEOUT_MS", "soon")]),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
