//! # Adapters
//!
//! Node-side implementations of the coordinator's outbound ports.

pub mod board_payloads;
pub mod metrics_observer;

pub use board_payloads::{BoardPayloads, StageBody};
pub use metrics_observer::MetricsObserver;
