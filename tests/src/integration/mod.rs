//! Cross-crate integration flows.

pub mod config_flows;
pub mod properties;
pub mod two_boards;

use node_runtime::{KeyMeshContainer, NodeConfig, NodeRuntime};
use shared_bus::{InMemoryBroker, MessageTransport};
use shared_types::PeerId;
use std::sync::Arc;
use std::time::Duration;

/// Board config with fast timings for tests.
pub fn board_config(uid: &str, peers: &[&str]) -> NodeConfig {
    let mut config = NodeConfig::default();
    config.board.uid = uid.to_string();
    config.board.name = format!("esp-{uid}");
    config.peers = peers.iter().map(|p| p.to_string()).collect();
    config.exchange.timeout_ms = 100;
    config.exchange.max_retries = 3;
    config.exchange.tick_interval_ms = 10;
    config
}

/// A board runtime on `broker`.
pub fn board(broker: &Arc<InMemoryBroker>, uid: &str, peers: &[&str]) -> NodeRuntime {
    let transport: Arc<dyn MessageTransport> = broker.clone();
    NodeRuntime::with_transport(board_config(uid, peers), transport)
        .unwrap_or_else(|e| panic!("board {uid} config: {e}"))
}

/// Poll `check` every few milliseconds until it holds or `limit` passes.
pub async fn eventually(limit: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    check()
}

/// Session state of `peer` on `container` as a string.
pub fn state_of(container: &KeyMeshContainer, peer: &str) -> &'static str {
    container.coordinator.state(&PeerId::from(peer)).as_str()
}
