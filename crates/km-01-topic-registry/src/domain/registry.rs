//! Topic registry built once from [`TopicConfig`].

use crate::error::RegistryError;
use shared_bus::validate_topic_name;
use shared_types::{Direction, ExchangeKind, TopicConfig, TopicPair};
use std::collections::HashMap;
use tracing::{debug, info};

/// Validated, immutable mapping between exchange kinds and topics.
#[derive(Debug, Clone)]
pub struct TopicRegistry {
    /// Pairs indexed by `ExchangeKind::index()`.
    pairs: [TopicPair; 4],
    /// Reverse lookup: topic -> (kind, direction).
    by_topic: HashMap<String, (ExchangeKind, Direction)>,
}

impl TopicRegistry {
    /// Build a registry, checking that all eight topics are valid topic
    /// names and mutually distinct.
    pub fn new(config: &TopicConfig) -> Result<Self, RegistryError> {
        let mut by_topic: HashMap<String, (ExchangeKind, Direction)> = HashMap::new();

        for (kind, pair) in config.iter() {
            for (direction, topic) in [
                (Direction::Request, &pair.request),
                (Direction::Response, &pair.response),
            ] {
                if topic.is_empty() {
                    return Err(RegistryError::EmptyTopic { kind, direction });
                }

                validate_topic_name(topic).map_err(|source| RegistryError::InvalidTopic {
                    kind,
                    direction,
                    source,
                })?;

                if let Some(&(first, first_direction)) = by_topic.get(topic.as_str()) {
                    return Err(RegistryError::DuplicateTopic {
                        topic: topic.clone(),
                        first,
                        first_direction,
                        second: kind,
                        second_direction: direction,
                    });
                }

                debug!(kind = %kind, direction = ?direction, topic = %topic, "Registered topic");
                by_topic.insert(topic.clone(), (kind, direction));
            }
        }

        let pairs = ExchangeKind::ALL.map(|kind| config.pair(kind).clone());

        info!(topics = by_topic.len(), "Topic registry initialized");

        Ok(Self { pairs, by_topic })
    }

    /// The topic pair for `kind`.
    #[must_use]
    pub fn lookup(&self, kind: ExchangeKind) -> &TopicPair {
        &self.pairs[kind.index()]
    }

    /// Topic requests of `kind` are published to.
    #[must_use]
    pub fn request_topic(&self, kind: ExchangeKind) -> &str {
        &self.lookup(kind).request
    }

    /// Topic responses of `kind` are published to.
    #[must_use]
    pub fn response_topic(&self, kind: ExchangeKind) -> &str {
        &self.lookup(kind).response
    }

    /// Which kind and direction `topic` belongs to, if any.
    #[must_use]
    pub fn classify(&self, topic: &str) -> Option<(ExchangeKind, Direction)> {
        self.by_topic.get(topic).copied()
    }

    /// The kind whose request topic is `topic`.
    #[must_use]
    pub fn kind_for_request_topic(&self, topic: &str) -> Option<ExchangeKind> {
        match self.classify(topic) {
            Some((kind, Direction::Request)) => Some(kind),
            _ => None,
        }
    }

    /// The kind whose response topic is `topic`.
    #[must_use]
    pub fn kind_for_response_topic(&self, topic: &str) -> Option<ExchangeKind> {
        match self.classify(topic) {
            Some((kind, Direction::Response)) => Some(kind),
            _ => None,
        }
    }

    /// The four request topics, in stage order.
    pub fn request_topics(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|p| p.request.as_str())
    }

    /// The four response topics, in stage order.
    pub fn response_topics(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|p| p.response.as_str())
    }
}
