//! # Shared Types Crate
//!
//! Domain entities, topic configuration and the `ExchangeEnvelope` wire
//! format shared by the KeyMesh subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: exchange kinds, topic pairs and peer
//!   identities are defined once, here.
//! - **Closed stage set**: `ExchangeKind` is a closed enum and carries the
//!   fixed stage order as an explicit transition table.
//! - **Envelope Authority**: the envelope's `sender` is the only identity a
//!   receiver trusts; bodies stay opaque.

pub mod correlation;
pub mod entities;
pub mod envelope;
pub mod errors;
pub mod topics;

pub use correlation::CorrelationId;
pub use entities::*;
pub use envelope::{Direction, ExchangeEnvelope};
pub use errors::*;
pub use topics::TopicConfig;
