//! # Error Types
//!
//! Errors shared across subsystems.

use thiserror::Error;

/// Errors decoding an exchange envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// Payload is not a well-formed envelope.
    #[error("Malformed envelope: {0}")]
    Malformed(String),

    /// Envelope version not supported.
    #[error("Unsupported version: received {received}, supported {supported}")]
    UnsupportedVersion { received: u16, supported: u16 },

    /// Sender or recipient missing.
    #[error("Envelope has an empty sender or recipient")]
    MissingIdentity,
}
