//! Timeout ticker.
//!
//! Drives `ExchangeCoordinator::tick` on a fixed interval so expired
//! requests are retried or failed without any inbound traffic.

use keymesh_telemetry::{ACTIVE_SESSIONS, PENDING_REQUESTS};
use km_03_exchange_coordinator::{ExchangeCoordinator, StepOutcome};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Periodic driver for request deadlines.
pub struct TickHandler {
    coordinator: Arc<ExchangeCoordinator>,
    interval: Duration,
}

impl TickHandler {
    pub fn new(coordinator: Arc<ExchangeCoordinator>, interval: Duration) -> Self {
        Self {
            coordinator,
            interval,
        }
    }

    /// One pass: expire due requests and refresh the gauges.
    pub fn tick_once(&self, now: Instant) -> Vec<StepOutcome> {
        let outcomes = self.coordinator.tick(now);

        for outcome in &outcomes {
            if let StepOutcome::Failed { peer_id, reason } = outcome {
                warn!(peer = %peer_id, reason = %reason, "Exchange session failed");
            }
        }

        PENDING_REQUESTS.set(gauge_value(self.coordinator.tracker().pending_count()));
        ACTIVE_SESSIONS.set(gauge_value(self.coordinator.active_sessions().len()));

        outcomes
    }

    /// Tick until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval_ms = self.interval.as_millis() as u64, "Tick handler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let outcomes = self.tick_once(Instant::now());
                    if !outcomes.is_empty() {
                        debug!(outcomes = outcomes.len(), "Tick produced session changes");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Tick handler stopping");
                        break;
                    }
                }
            }
        }
    }
}

fn gauge_value(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}
