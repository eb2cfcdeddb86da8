//! # Subscriptions
//!
//! The receiving side of the broker.

use crate::topic_filter::topic_matches;
use crate::transport::{TransportError, TransportMessage};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// A subscription handle for receiving messages matching its topic filters.
///
/// When dropped, the subscription is automatically cleaned up.
pub struct Subscription {
    /// The broadcast receiver.
    receiver: broadcast::Receiver<TransportMessage>,

    /// Topic filters for this subscription.
    filters: Vec<String>,

    /// Reference to subscription tracking (for cleanup).
    subscriptions: Arc<Mutex<HashMap<String, usize>>>,
}

impl Subscription {
    pub(crate) fn new(
        receiver: broadcast::Receiver<TransportMessage>,
        filters: Vec<String>,
        subscriptions: Arc<Mutex<HashMap<String, usize>>>,
    ) -> Self {
        Self {
            receiver,
            filters,
            subscriptions,
        }
    }

    /// Receive the next message whose topic matches any of the filters.
    ///
    /// # Returns
    ///
    /// - `Some(message)` - The next matching message
    /// - `None` - The broker was closed
    pub async fn recv(&mut self) -> Option<TransportMessage> {
        loop {
            let message = match self.receiver.recv().await {
                Ok(m) => m,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(
                        filters = ?self.filters,
                        lagged = count,
                        "Subscriber lagged, messages dropped"
                    );
                    continue;
                }
            };

            if self.matches(&message.topic) {
                return Some(message);
            }
        }
    }

    /// Try to receive the next matching message without waiting.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(message))` - A matching message was available
    /// - `Ok(None)` - Nothing available right now
    /// - `Err(TransportError::Closed)` - The broker was closed
    pub fn try_recv(&mut self) -> Result<Option<TransportMessage>, TransportError> {
        loop {
            let message = match self.receiver.try_recv() {
                Ok(m) => m,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(TransportError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            };

            if self.matches(&message.topic) {
                return Ok(Some(message));
            }
        }
    }

    /// The topic filters of this subscription.
    #[must_use]
    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    /// Whether `topic` matches any of the filters.
    #[must_use]
    pub fn matches(&self, topic: &str) -> bool {
        self.filters.iter().any(|f| topic_matches(topic, f))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut subs = self.subscriptions.lock();
        for filter in &self.filters {
            if let Some(count) = subs.get_mut(filter) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    subs.remove(filter);
                }
            }
        }
        debug!(filters = ?self.filters, "Subscription dropped");
    }
}

#[cfg(test)]
mod tests {
    use crate::broker::InMemoryBroker;
    use crate::transport::{MessageTransport, TransportError};
    use bytes::Bytes;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_recv_matching_message() {
        let broker = InMemoryBroker::new();
        let mut sub = broker.subscribe("/pubKey/+").unwrap();

        broker
            .publish("/pubKey/request", Bytes::from_static(b"hello"))
            .unwrap();

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("message");

        assert_eq!(received.topic, "/pubKey/request");
        assert_eq!(&received.payload[..], b"hello");
    }

    #[tokio::test]
    async fn test_non_matching_topics_are_skipped() {
        let broker = InMemoryBroker::new();
        let mut sub = broker.subscribe("/signatureExchange/response").unwrap();

        broker
            .publish("/pubKey/response", Bytes::from_static(b"skip"))
            .unwrap();
        broker
            .publish("/signatureExchange/response", Bytes::from_static(b"take"))
            .unwrap();

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("message");
        assert_eq!(&received.payload[..], b"take");
    }

    #[tokio::test]
    async fn test_multi_filter_subscription() {
        let broker = InMemoryBroker::new();
        let mut sub = broker
            .subscribe_many(&["/pubKey/response", "/signatureExchange/response"])
            .unwrap();

        broker
            .publish("/pubKey/request", Bytes::from_static(b"skip"))
            .unwrap();
        broker
            .publish("/signatureExchange/response", Bytes::from_static(b"sig"))
            .unwrap();
        broker
            .publish("/pubKey/response", Bytes::from_static(b"pk"))
            .unwrap();

        let first = sub.recv().await.expect("message");
        let second = sub.recv().await.expect("message");
        assert_eq!(&first.payload[..], b"sig");
        assert_eq!(&second.payload[..], b"pk");
        assert!(matches!(sub.try_recv(), Ok(None)));
    }

    #[tokio::test]
    async fn test_try_recv_empty() {
        let broker = InMemoryBroker::new();
        let mut sub = broker.subscribe("#").unwrap();
        assert!(matches!(sub.try_recv(), Ok(None)));
    }

    #[tokio::test]
    async fn test_closed_broker_ends_subscription() {
        let broker = InMemoryBroker::new();
        let mut sub = broker.subscribe("#").unwrap();

        broker.close();

        assert!(sub.recv().await.is_none());
        assert_eq!(sub.try_recv(), Err(TransportError::Closed));
    }

    #[test]
    fn test_drop_cleans_up_filter_count() {
        let broker = InMemoryBroker::new();
        {
            let _a = broker.subscribe("/pubKey/+").unwrap();
            let _b = broker.subscribe("/pubKey/+").unwrap();
            assert_eq!(broker.filter_count("/pubKey/+"), 2);
        }
        assert_eq!(broker.filter_count("/pubKey/+"), 0);
        assert_eq!(broker.subscriber_count(), 0);
    }
}
