//! Error types for the Topic Registry.
//!
//! Every variant is a startup-time misconfiguration; none can occur once a
//! registry has been built.

use shared_bus::TransportError;
use shared_types::{Direction, ExchangeKind};
use thiserror::Error;

/// The configured topics cannot form a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Registry misconfigured: {kind} {direction:?} topic is empty")]
    EmptyTopic {
        kind: ExchangeKind,
        direction: Direction,
    },

    #[error("Registry misconfigured: {kind} {direction:?} topic is invalid: {source}")]
    InvalidTopic {
        kind: ExchangeKind,
        direction: Direction,
        #[source]
        source: TransportError,
    },

    #[error(
        "Registry misconfigured: topic '{topic}' used by both {first} {first_direction:?} \
         and {second} {second_direction:?}"
    )]
    DuplicateTopic {
        topic: String,
        first: ExchangeKind,
        first_direction: Direction,
        second: ExchangeKind,
        second_direction: Direction,
    },
}
