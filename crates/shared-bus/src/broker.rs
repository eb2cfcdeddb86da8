//! # In-Memory Broker
//!
//! Process-local implementation of [`MessageTransport`].

use crate::subscriber::Subscription;
use crate::topic_filter::{validate_filter, validate_topic_name};
use crate::transport::{MessageTransport, TransportError, TransportMessage};
use crate::DEFAULT_CHANNEL_CAPACITY;
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, trace};

/// In-memory publish/subscribe broker.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer fan-out;
/// each subscription applies its own topic filter. Boards sharing one broker
/// instance behave like clients of one MQTT broker.
pub struct InMemoryBroker {
    /// Broadcast sender; `None` once the broker is closed.
    sender: RwLock<Option<broadcast::Sender<TransportMessage>>>,

    /// Active subscription count by filter.
    subscriptions: Arc<Mutex<HashMap<String, usize>>>,

    /// Total messages published.
    messages_published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl InMemoryBroker {
    /// Create a broker with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a broker buffering `capacity` messages per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: RwLock::new(Some(sender)),
            subscriptions: Arc::new(Mutex::new(HashMap::new())),
            messages_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Close the broker. Pending subscriptions drain and then end;
    /// further publishes fail with `TransportError::Closed`.
    pub fn close(&self) {
        if self.sender.write().take().is_some() {
            info!("In-memory broker closed");
        }
    }

    /// Whether `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.read().is_none()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender
            .read()
            .as_ref()
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Number of live subscriptions using exactly `filter`.
    #[must_use]
    pub fn filter_count(&self, filter: &str) -> usize {
        self.subscriptions.lock().get(filter).copied().unwrap_or(0)
    }

    /// Total messages published since creation.
    #[must_use]
    pub fn messages_published(&self) -> u64 {
        self.messages_published.load(Ordering::Relaxed)
    }

    /// Channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageTransport for InMemoryBroker {
    fn publish(&self, topic: &str, payload: Bytes) -> Result<usize, TransportError> {
        validate_topic_name(topic)?;

        let guard = self.sender.read();
        let sender = guard.as_ref().ok_or(TransportError::Closed)?;

        self.messages_published.fetch_add(1, Ordering::Relaxed);

        match sender.send(TransportMessage::new(topic, payload)) {
            Ok(receivers) => {
                trace!(topic = topic, receivers = receivers, "Message published");
                Ok(receivers)
            }
            Err(_) => {
                // No receivers - message is dropped, as a broker would
                debug!(topic = topic, "Message dropped (no subscribers)");
                Ok(0)
            }
        }
    }

    fn subscribe_many(&self, filters: &[&str]) -> Result<Subscription, TransportError> {
        if filters.is_empty() {
            return Err(TransportError::InvalidFilter {
                filter: String::new(),
                reason: "no filters given",
            });
        }
        for filter in filters {
            validate_filter(filter)?;
        }

        let guard = self.sender.read();
        let sender = guard.as_ref().ok_or(TransportError::Closed)?;
        let receiver = sender.subscribe();

        let filters: Vec<String> = filters.iter().map(|f| (*f).to_string()).collect();
        {
            let mut subs = self.subscriptions.lock();
            for filter in &filters {
                *subs.entry(filter.clone()).or_insert(0) += 1;
            }
        }

        debug!(filters = ?filters, "New subscription created");

        Ok(Subscription::new(
            receiver,
            filters,
            Arc::clone(&self.subscriptions),
        ))
    }
}
