//! Node runtime: owns the component container and the spawned tasks.

use crate::container::{ConfigError, KeyMeshContainer, NodeConfig};
use crate::handlers::{admin_router, TickHandler};
use anyhow::{Context, Result};
use parking_lot::Mutex;
use shared_bus::MessageTransport;
use shared_types::PeerId;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// How long `shutdown` waits for each task before giving up on it.
const TASK_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// The running board.
pub struct NodeRuntime {
    container: Arc<KeyMeshContainer>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl NodeRuntime {
    /// Create a runtime on a private in-process broker.
    pub fn new(config: NodeConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_container(KeyMeshContainer::new(config)?))
    }

    /// Create a runtime on a shared transport.
    pub fn with_transport(
        config: NodeConfig,
        transport: Arc<dyn MessageTransport>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::from_container(KeyMeshContainer::with_transport(
            config, transport,
        )?))
    }

    fn from_container(container: KeyMeshContainer) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            container: Arc::new(container),
            shutdown_tx,
            shutdown_rx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Start the node.
    ///
    /// ## Startup Sequence
    ///
    /// 1. Subscribe the bus router to the exchange topics
    /// 2. Spawn the router and the timeout ticker
    /// 3. Start an exchange session with every configured peer
    ///
    /// A peer whose session cannot start is logged and skipped.
    pub async fn start(&self) -> Result<()> {
        let config = &self.container.config;
        info!(
            board = %self.container.local_peer,
            name = %config.board.name,
            broker = %format!("{}:{}", config.broker.address, config.broker.port),
            client_id = %config.client_id(),
            wifi = %config.wifi.ssid,
            "Starting KeyMesh node"
        );

        let subscription = self
            .container
            .router
            .subscribe()
            .context("Failed to subscribe to exchange topics")?;
        let router = Arc::clone(&self.container.router);
        let router_task = tokio::spawn(router.run(subscription, self.shutdown_rx.clone()));

        let ticker = TickHandler::new(
            Arc::clone(&self.container.coordinator),
            config.exchange.tick_interval(),
        );
        let tick_task = tokio::spawn(ticker.run(self.shutdown_rx.clone()));

        self.tasks.lock().extend([router_task, tick_task]);

        let started = self.start_sessions(&config.peer_ids());
        info!(
            peers = config.peers.len(),
            started = started,
            "KeyMesh node running"
        );
        Ok(())
    }

    /// Start a session with each of `peers`; returns how many started.
    pub fn start_sessions(&self, peers: &[PeerId]) -> usize {
        let mut started = 0;
        for peer in peers {
            match self.container.coordinator.start(peer) {
                Ok(correlation_id) => {
                    started += 1;
                    info!(peer = %peer, correlation_id = %correlation_id, "Exchange session started");
                }
                Err(e) => warn!(peer = %peer, error = %e, "Failed to start exchange session"),
            }
        }
        started
    }

    /// Serve the admin router on `port` until shutdown. Port 0 disables it.
    ///
    /// Returns the bound address when serving.
    pub async fn serve_admin(&self, port: u16) -> Result<Option<SocketAddr>> {
        if port == 0 {
            info!("Admin server disabled");
            return Ok(None);
        }

        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port)))
            .await
            .with_context(|| format!("Failed to bind admin port {port}"))?;
        let addr = listener.local_addr()?;
        let app = admin_router(Arc::clone(&self.container));
        let mut shutdown = self.shutdown_rx.clone();

        let task = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    while shutdown.changed().await.is_ok() {
                        if *shutdown.borrow() {
                            break;
                        }
                    }
                })
                .await;
            if let Err(e) = served {
                error!(error = %e, "Admin server failed");
            }
        });
        self.tasks.lock().push(task);

        info!(addr = %addr, "Admin server listening");
        Ok(Some(addr))
    }

    /// Signal every task to stop and wait for them.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            match tokio::time::timeout(TASK_SHUTDOWN_TIMEOUT, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Task ended abnormally"),
                Err(_) => warn!("Task did not stop in time"),
            }
        }

        info!(
            pending = self.container.tracker.pending_count(),
            "Shutdown complete"
        );
    }

    /// Get a reference to the component container.
    pub fn container(&self) -> Arc<KeyMeshContainer> {
        Arc::clone(&self.container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use km_03_exchange_coordinator::SessionState;

    #[tokio::test]
    async fn test_start_issues_requests_to_configured_peers() {
        let mut config = NodeConfig::default();
        config.peers = vec!["peerA".to_string(), "peerB".to_string()];
        let runtime = NodeRuntime::new(config).unwrap();

        runtime.start().await.unwrap();
        let container = runtime.container();
        assert_eq!(container.tracker.pending_count(), 2);
        assert_eq!(
            container.coordinator.state(&PeerId::from("peerA")),
            SessionState::AwaitingPublicKey
        );

        runtime.shutdown().await;
        assert!(runtime.tasks.lock().is_empty());
    }

    #[tokio::test]
    async fn test_admin_disabled_on_port_zero() {
        let runtime = NodeRuntime::new(NodeConfig::default()).unwrap();
        assert_eq!(runtime.serve_admin(0).await.unwrap(), None);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = NodeConfig::default();
        config.board.uid = String::new();
        assert!(matches!(
            NodeRuntime::new(config),
            Err(ConfigError::EmptyBoardUid)
        ));
    }
}
