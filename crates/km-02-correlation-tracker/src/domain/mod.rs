//! Domain Layer
//!
//! Pending-request bookkeeping and the values the tracker reports.
//!
//! RULES:
//! - No I/O operations
//! - No async code

pub mod config;
pub mod events;
pub mod pending;

pub use config::TrackerConfig;
pub use events::{ExchangeTimedOut, Resolution, RetryAttempt, TickReport};
pub use pending::PendingRequest;
