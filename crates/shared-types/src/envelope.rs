//! # `ExchangeEnvelope`
//!
//! The wrapper for every message published on an exchange topic.
//!
//! ## Properties
//!
//! - **Versioning**: all messages include a `version` field; decoders reject
//!   versions they do not speak.
//! - **Correlation**: a request carries a fresh `correlation_id`; the response
//!   echoes it unchanged.
//! - **Addressing**: topics are shared by every board on the broker, so the
//!   envelope names `sender` and `recipient` explicitly.
//! - **Opaque body**: stage payloads (keys, signatures, CEKs) are produced and
//!   consumed outside the core; the envelope carries them as hex.

use crate::correlation::CorrelationId;
use crate::entities::{ExchangeKind, PeerId};
use crate::errors::EnvelopeError;
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use std::time::{SystemTime, UNIX_EPOCH};

/// Whether an envelope travels on the request or the response topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Request,
    Response,
}

/// Wire format for exchange requests and responses.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeEnvelope {
    /// Protocol version for forward compatibility.
    pub version: u16,

    /// Links a response to the request that caused it.
    pub correlation_id: CorrelationId,

    /// Which exchange this message belongs to.
    pub kind: ExchangeKind,

    /// Request or response.
    pub direction: Direction,

    /// Board that published the message.
    pub sender: PeerId,

    /// Board the message is meant for.
    pub recipient: PeerId,

    /// Unix timestamp (seconds) at creation.
    pub timestamp: u64,

    /// Stage payload, opaque to the core.
    #[serde_as(as = "Hex")]
    pub body: Vec<u8>,
}

impl ExchangeEnvelope {
    /// Current protocol version.
    pub const CURRENT_VERSION: u16 = 1;

    /// Build a request envelope.
    pub fn request(
        correlation_id: CorrelationId,
        kind: ExchangeKind,
        sender: PeerId,
        recipient: PeerId,
        body: Vec<u8>,
    ) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            correlation_id,
            kind,
            direction: Direction::Request,
            sender,
            recipient,
            timestamp: now_secs(),
            body,
        }
    }

    /// Build the response to `request`, sent by `sender` back to the
    /// requester under the same correlation id.
    pub fn response_to(request: &ExchangeEnvelope, sender: PeerId, body: Vec<u8>) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            correlation_id: request.correlation_id,
            kind: request.kind,
            direction: Direction::Response,
            sender,
            recipient: request.sender.clone(),
            timestamp: now_secs(),
            body,
        }
    }

    /// Serialize to the JSON wire format.
    pub fn encode(&self) -> Result<Vec<u8>, EnvelopeError> {
        serde_json::to_vec(self).map_err(|e| EnvelopeError::Malformed(e.to_string()))
    }

    /// Parse from the JSON wire format.
    ///
    /// # Errors
    ///
    /// - `EnvelopeError::Malformed` - not a valid envelope
    /// - `EnvelopeError::UnsupportedVersion` - version differs from ours
    /// - `EnvelopeError::MissingIdentity` - empty sender or recipient
    pub fn decode(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let envelope: ExchangeEnvelope =
            serde_json::from_slice(bytes).map_err(|e| EnvelopeError::Malformed(e.to_string()))?;

        if envelope.version != Self::CURRENT_VERSION {
            return Err(EnvelopeError::UnsupportedVersion {
                received: envelope.version,
                supported: Self::CURRENT_VERSION,
            });
        }

        if envelope.sender.is_empty() || envelope.recipient.is_empty() {
            return Err(EnvelopeError::MissingIdentity);
        }

        Ok(envelope)
    }

    /// Whether this envelope is addressed to `peer`.
    #[must_use]
    pub fn is_for(&self, peer: &PeerId) -> bool {
        &self.recipient == peer
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> ExchangeEnvelope {
        ExchangeEnvelope::request(
            CorrelationId::new(),
            ExchangeKind::PublicKey,
            PeerId::from("1234"),
            PeerId::from("5678"),
            vec![0xde, 0xad, 0xbe, 0xef],
        )
    }

    #[test]
    fn test_body_is_hex_on_the_wire() {
        let request = sample_request();
        let json = String::from_utf8(request.encode().unwrap()).unwrap();
        assert!(json.contains("\"body\":\"deadbeef\""));
        assert!(json.contains("\"direction\":\"request\""));
        assert!(json.contains("\"kind\":\"public_key\""));
    }

    #[test]
    fn test_decode_encoded_request() {
        let request = sample_request();
        let decoded = ExchangeEnvelope::decode(&request.encode().unwrap()).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_response_echoes_correlation_and_swaps_peers() {
        let request = sample_request();
        let response = ExchangeEnvelope::response_to(&request, PeerId::from("5678"), vec![1]);

        assert_eq!(response.correlation_id, request.correlation_id);
        assert_eq!(response.kind, request.kind);
        assert_eq!(response.direction, Direction::Response);
        assert_eq!(response.recipient, PeerId::from("1234"));
        assert!(response.is_for(&PeerId::from("1234")));
        assert!(!response.is_for(&PeerId::from("5678")));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = ExchangeEnvelope::decode(b"not json");
        assert!(matches!(result, Err(EnvelopeError::Malformed(_))));
    }

    #[test]
    fn test_decode_rejects_future_version() {
        let mut request = sample_request();
        request.version = 9;
        let bytes = serde_json::to_vec(&request).unwrap();
        let result = ExchangeEnvelope::decode(&bytes);
        assert!(matches!(
            result,
            Err(EnvelopeError::UnsupportedVersion { received: 9, supported: 1 })
        ));
    }

    #[test]
    fn test_decode_rejects_empty_sender() {
        let mut request = sample_request();
        request.sender = PeerId::from("");
        let bytes = serde_json::to_vec(&request).unwrap();
        assert!(matches!(
            ExchangeEnvelope::decode(&bytes),
            Err(EnvelopeError::MissingIdentity)
        ));
    }
}
