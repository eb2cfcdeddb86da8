//! # Shared Bus - Publish/Subscribe Transport
//!
//! The transport port every KeyMesh subsystem talks through, and an in-memory
//! broker implementing it with MQTT topic-filter semantics.
//!
//! ## Transport Rules
//!
//! - Subsystems never call each other over the wire directly; they publish to
//!   topics and subscribe with topic filters.
//! - `publish` never blocks; delivery to slow subscribers is best-effort
//!   (lagging subscribers skip messages rather than stall the publisher).
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │   Board A    │                    │   Board B    │
//! │              │    publish()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │    Broker    │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe("/pubKey/+")
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod broker;
pub mod subscriber;
pub mod topic_filter;
pub mod transport;

// Re-export main types
pub use broker::InMemoryBroker;
pub use subscriber::Subscription;
pub use topic_filter::{topic_matches, validate_filter, validate_topic_name};
pub use transport::{MessageTransport, TransportError, TransportMessage};

/// Messages to buffer per subscriber before lagging subscribers drop.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Longest topic name or filter accepted, in bytes (MQTT limit).
pub const MAX_TOPIC_LENGTH: usize = 65_535;
