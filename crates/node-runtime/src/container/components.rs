//! # Component Container
//!
//! Builds every KeyMesh component once, in dependency order, and holds the
//! shared handles the runtime's tasks work with.
//!
//! ```text
//! transport ─► TopicRegistry ─► CorrelationTracker ─► ExchangeCoordinator
//!                    │                                       │
//!                    └───────────► RequestResponder          │
//!                                        │                   │
//!                                        └──► BusRouter ◄────┘
//! ```

use crate::adapters::{BoardPayloads, MetricsObserver};
use crate::container::{ConfigError, NodeConfig};
use km_01_topic_registry::TopicRegistry;
use km_02_correlation_tracker::{CorrelationTracker, TrackerConfig};
use km_03_exchange_coordinator::{
    BusRouter, CoordinatorConfig, ExchangeCoordinator, ExchangeObserver, RequestResponder,
};
use shared_bus::{InMemoryBroker, MessageTransport};
use shared_types::PeerId;
use std::sync::Arc;
use tracing::info;

/// All components of one board.
pub struct KeyMeshContainer {
    pub config: NodeConfig,
    pub local_peer: PeerId,
    pub transport: Arc<dyn MessageTransport>,
    pub registry: Arc<TopicRegistry>,
    pub payloads: Arc<BoardPayloads>,
    pub tracker: Arc<CorrelationTracker>,
    pub coordinator: Arc<ExchangeCoordinator>,
    pub responder: Arc<RequestResponder>,
    pub router: Arc<BusRouter>,
}

impl KeyMeshContainer {
    /// Build the components on a private in-process broker.
    pub fn new(config: NodeConfig) -> Result<Self, ConfigError> {
        Self::with_transport(config, Arc::new(InMemoryBroker::new()))
    }

    /// Build the components on `transport`. Boards sharing a transport can
    /// exchange with each other.
    ///
    /// # Errors
    ///
    /// Any `NodeConfig::validate` failure. A misconfigured topic registry is
    /// fatal at startup.
    pub fn with_transport(
        config: NodeConfig,
        transport: Arc<dyn MessageTransport>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let local_peer = config.local_peer();
        let observer: Arc<dyn ExchangeObserver> = Arc::new(MetricsObserver);

        // Level 0: topics
        let registry = Arc::new(TopicRegistry::new(&config.topics)?);

        // Level 1: correlation tracking
        let tracker = Arc::new(CorrelationTracker::new(
            TrackerConfig::new(local_peer.clone()).with_max_retries(config.exchange.max_retries),
            Arc::clone(&registry),
            Arc::clone(&transport),
        ));

        // Level 2: exchange state machine and responder
        let payloads = Arc::new(BoardPayloads::new(&config.board));
        let coordinator = Arc::new(
            ExchangeCoordinator::new(
                CoordinatorConfig {
                    request_timeout: config.exchange.timeout(),
                },
                Arc::clone(&tracker),
                payloads.clone(),
            )
            .with_observer(Arc::clone(&observer)),
        );
        let responder = Arc::new(
            RequestResponder::new(
                local_peer.clone(),
                Arc::clone(&registry),
                Arc::clone(&transport),
                payloads.clone(),
            )
            .with_observer(Arc::clone(&observer)),
        );

        // Level 3: routing
        let router = Arc::new(
            BusRouter::new(
                Arc::clone(&registry),
                Arc::clone(&transport),
                Arc::clone(&coordinator),
            )
            .with_responder(Arc::clone(&responder))
            .with_observer(observer),
        );

        info!(
            board = %local_peer,
            name = %config.board.name,
            peers = config.peers.len(),
            "Components initialized"
        );

        Ok(Self {
            config,
            local_peer,
            transport,
            registry,
            payloads,
            tracker,
            coordinator,
            responder,
            router,
        })
    }
}
