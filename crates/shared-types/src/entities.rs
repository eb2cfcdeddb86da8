//! # Domain Entities
//!
//! Core value types shared across subsystems.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of the distributed key/signature distribution protocol.
///
/// The set is closed and the stage order is fixed:
///
/// ```text
/// PublicKey ──→ Signature ──→ Cek ──→ DistributedPack ──→ (complete)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeKind {
    /// Public key exchange.
    PublicKey,
    /// Signature exchange over the exchanged keys.
    Signature,
    /// Content-encryption-key distribution (distributed unpack).
    Cek,
    /// Distributed pack operation.
    DistributedPack,
}

impl ExchangeKind {
    /// All kinds, in stage order.
    pub const ALL: [ExchangeKind; 4] = [
        ExchangeKind::PublicKey,
        ExchangeKind::Signature,
        ExchangeKind::Cek,
        ExchangeKind::DistributedPack,
    ];

    /// The first stage of every session.
    pub const FIRST: ExchangeKind = ExchangeKind::PublicKey;

    /// Transition table: the stage that follows `self`, or `None` after the
    /// final stage.
    #[must_use]
    pub const fn next(self) -> Option<ExchangeKind> {
        match self {
            ExchangeKind::PublicKey => Some(ExchangeKind::Signature),
            ExchangeKind::Signature => Some(ExchangeKind::Cek),
            ExchangeKind::Cek => Some(ExchangeKind::DistributedPack),
            ExchangeKind::DistributedPack => None,
        }
    }

    /// Zero-based position in the stage order.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            ExchangeKind::PublicKey => 0,
            ExchangeKind::Signature => 1,
            ExchangeKind::Cek => 2,
            ExchangeKind::DistributedPack => 3,
        }
    }

    /// Stable lowercase name used in logs and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ExchangeKind::PublicKey => "public_key",
            ExchangeKind::Signature => "signature",
            ExchangeKind::Cek => "cek",
            ExchangeKind::DistributedPack => "distributed_pack",
        }
    }
}

impl fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a board taking part in exchanges (its board UID).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    /// Create a peer id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is empty (never valid on the wire).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PeerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Request/response topic pair for one exchange kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopicPair {
    /// Topic requests are published to.
    pub request: String,
    /// Topic responses are published to.
    pub response: String,
}

impl TopicPair {
    /// Create a topic pair.
    pub fn new(request: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            request: request.into(),
            response: response.into(),
        }
    }
}
