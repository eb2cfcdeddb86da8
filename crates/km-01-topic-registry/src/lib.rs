//! # KM-01 Topic Registry
//!
//! Static lookup from [`ExchangeKind`](shared_types::ExchangeKind) to its
//! request/response [`TopicPair`](shared_types::TopicPair), plus the reverse
//! lookups the bus router uses to classify incoming messages.
//!
//! ## Invariants
//!
//! - **INVARIANT-1**: all eight topics are non-empty, valid MQTT topic names
//!   (no wildcards).
//! - **INVARIANT-2**: the eight topics are mutually distinct.
//!
//! Both are checked once, in [`TopicRegistry::new`]. A registry that exists
//! is valid; it is never mutated afterwards and is shared read-only across
//! threads.
//!
//! ## Usage Example
//!
//! ```ignore
//! use km_01_topic_registry::TopicRegistry;
//! use shared_types::{ExchangeKind, TopicConfig};
//!
//! let registry = TopicRegistry::new(&TopicConfig::default())?;
//! assert_eq!(registry.lookup(ExchangeKind::PublicKey).request, "/pubKey/request");
//! ```

pub mod domain;
pub mod error;

pub use domain::TopicRegistry;
pub use error::RegistryError;
