//! # Topic Configuration
//!
//! The eight topic strings a board uses, one request/response pair per
//! exchange kind. Supplied once at startup; validation happens when the
//! topic registry is built from it.

use crate::entities::{ExchangeKind, TopicPair};
use serde::{Deserialize, Serialize};

/// Default topic strings of the board firmware.
pub const PUBKEY_REQUEST_TOPIC: &str = "/pubKey/request";
pub const PUBKEY_RESPONSE_TOPIC: &str = "/pubKey/response";
pub const SIGNATURE_REQUEST_TOPIC: &str = "/signatureExchange/request";
pub const SIGNATURE_RESPONSE_TOPIC: &str = "/signatureExchange/response";
pub const CEK_REQUEST_TOPIC: &str = "/distribuitedUnpack/request";
pub const CEK_RESPONSE_TOPIC: &str = "/distribuitedUnpack/response";
pub const PACK_REQUEST_TOPIC: &str = "/distribuitedPack/request";
pub const PACK_RESPONSE_TOPIC: &str = "/distribuitedPack/response";

/// Topic pairs for all exchange kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicConfig {
    pub public_key: TopicPair,
    pub signature: TopicPair,
    pub cek: TopicPair,
    pub distributed_pack: TopicPair,
}

impl TopicConfig {
    /// The configured pair for `kind`.
    #[must_use]
    pub fn pair(&self, kind: ExchangeKind) -> &TopicPair {
        match kind {
            ExchangeKind::PublicKey => &self.public_key,
            ExchangeKind::Signature => &self.signature,
            ExchangeKind::Cek => &self.cek,
            ExchangeKind::DistributedPack => &self.distributed_pack,
        }
    }

    /// Mutable access, used by configuration overrides.
    pub fn pair_mut(&mut self, kind: ExchangeKind) -> &mut TopicPair {
        match kind {
            ExchangeKind::PublicKey => &mut self.public_key,
            ExchangeKind::Signature => &mut self.signature,
            ExchangeKind::Cek => &mut self.cek,
            ExchangeKind::DistributedPack => &mut self.distributed_pack,
        }
    }

    /// Iterate `(kind, pair)` in stage order.
    pub fn iter(&self) -> impl Iterator<Item = (ExchangeKind, &TopicPair)> {
        ExchangeKind::ALL.into_iter().map(move |k| (k, self.pair(k)))
    }
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            public_key: TopicPair::new(PUBKEY_REQUEST_TOPIC, PUBKEY_RESPONSE_TOPIC),
            signature: TopicPair::new(SIGNATURE_REQUEST_TOPIC, SIGNATURE_RESPONSE_TOPIC),
            cek: TopicPair::new(CEK_REQUEST_TOPIC, CEK_RESPONSE_TOPIC),
            distributed_pack: TopicPair::new(PACK_REQUEST_TOPIC, PACK_RESPONSE_TOPIC),
        }
    }
}
