//! Tracker configuration.

use shared_types::PeerId;

/// Default number of re-publishes before a request times out.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Configuration for a [`CorrelationTracker`](crate::CorrelationTracker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Board id written as `sender` into every request envelope.
    pub local_peer: PeerId,
    /// Re-publishes allowed per request after its first deadline passes.
    pub max_retries: u32,
}

impl TrackerConfig {
    pub fn new(local_peer: impl Into<PeerId>) -> Self {
        Self {
            local_peer: local_peer.into(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Override the retry budget.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::new("1234");
        assert_eq!(config.local_peer, PeerId::from("1234"));
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.with_max_retries(0).max_retries, 0);
    }
}
