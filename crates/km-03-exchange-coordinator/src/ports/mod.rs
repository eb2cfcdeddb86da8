//! Ports Layer
//!
//! - `outbound`: what the coordinator needs from its host (stage payloads,
//!   activity observation)

pub mod outbound;

pub use outbound::{ExchangeObserver, NoopObserver, StagePayloads, StaticPayloads};
