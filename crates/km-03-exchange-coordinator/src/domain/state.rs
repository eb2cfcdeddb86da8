//! Per-peer session state.

use shared_types::ExchangeKind;
use std::fmt;

/// Where a peer's exchange session stands.
///
/// ```text
/// Idle ─start─► AwaitingPublicKey ─► AwaitingSignature ─► AwaitingCek ─► AwaitingPack ─► Complete
///                      │                    │                  │               │
///                      └────────────────────┴── timeout ───────┴───────────────┴──────► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    AwaitingPublicKey,
    AwaitingSignature,
    AwaitingCek,
    AwaitingPack,
    Complete,
    Failed,
}

impl SessionState {
    /// The state that waits for a `kind` response.
    #[must_use]
    pub const fn awaiting(kind: ExchangeKind) -> Self {
        match kind {
            ExchangeKind::PublicKey => SessionState::AwaitingPublicKey,
            ExchangeKind::Signature => SessionState::AwaitingSignature,
            ExchangeKind::Cek => SessionState::AwaitingCek,
            ExchangeKind::DistributedPack => SessionState::AwaitingPack,
        }
    }

    /// The stage this state is waiting on, if any.
    #[must_use]
    pub const fn awaited_kind(self) -> Option<ExchangeKind> {
        match self {
            SessionState::AwaitingPublicKey => Some(ExchangeKind::PublicKey),
            SessionState::AwaitingSignature => Some(ExchangeKind::Signature),
            SessionState::AwaitingCek => Some(ExchangeKind::Cek),
            SessionState::AwaitingPack => Some(ExchangeKind::DistributedPack),
            SessionState::Idle | SessionState::Complete | SessionState::Failed => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, SessionState::Complete | SessionState::Failed)
    }

    /// Waiting on a response.
    #[must_use]
    pub const fn is_in_progress(self) -> bool {
        self.awaited_kind().is_some()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingPublicKey => "awaiting_public_key",
            SessionState::AwaitingSignature => "awaiting_signature",
            SessionState::AwaitingCek => "awaiting_cek",
            SessionState::AwaitingPack => "awaiting_pack",
            SessionState::Complete => "complete",
            SessionState::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
