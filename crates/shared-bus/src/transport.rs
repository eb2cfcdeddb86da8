//! # Transport Port
//!
//! The driven port through which the core reaches the message broker.
//! An MQTT client library would implement this for a real broker;
//! `InMemoryBroker` implements it in-process.

use crate::subscriber::Subscription;
use bytes::Bytes;
use thiserror::Error;

/// A message delivered to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportMessage {
    /// Topic the message was published on.
    pub topic: String,
    /// Raw payload.
    pub payload: Bytes,
}

impl TransportMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Errors from transport operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The broker connection is closed.
    #[error("Transport closed")]
    Closed,

    /// Topic names used for publishing must be non-empty and wildcard-free.
    #[error("Invalid topic name '{topic}': {reason}")]
    InvalidTopic { topic: String, reason: &'static str },

    /// Subscription filter is malformed.
    #[error("Invalid topic filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: &'static str },
}

/// Publish/subscribe transport.
///
/// Both operations are non-blocking: `publish` hands the message to the
/// broker and returns, `subscribe` registers a filter and returns a handle
/// whose `recv` is the only suspension point.
pub trait MessageTransport: Send + Sync {
    /// Publish `payload` on `topic`.
    ///
    /// # Returns
    ///
    /// The number of subscriptions the message was handed to.
    fn publish(&self, topic: &str, payload: Bytes) -> Result<usize, TransportError>;

    /// Subscribe with several MQTT topic filters at once, as one SUBSCRIBE
    /// packet would. The returned handle yields messages matching any of them.
    fn subscribe_many(&self, filters: &[&str]) -> Result<Subscription, TransportError>;

    /// Subscribe with an MQTT topic filter (`+` and trailing `#` wildcards).
    fn subscribe(&self, filter: &str) -> Result<Subscription, TransportError> {
        self.subscribe_many(&[filter])
    }
}
