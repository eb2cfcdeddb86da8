//! Adapters Layer
//!
//! - `bus_adapter`: transport subscription and message dispatch

pub mod bus_adapter;

pub use bus_adapter::{BusRouter, DropReason, RouteOutcome};
