//! Service Layer

pub mod tracker;

pub use tracker::{CorrelationTracker, TrackerStats, TrackerStatsSnapshot};
