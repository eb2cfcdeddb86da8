//! # KM-03 Exchange Coordinator
//!
//! Drives each peer through the fixed exchange sequence
//! `PublicKey → Signature → Cek → DistributedPack`, and answers the same
//! exchanges when a peer initiates them.
//!
//! ## Architecture
//!
//! ```text
//!                    ┌────────────────────────────┐
//!  response topics ─►│          BusRouter         │◄─ request topics
//!                    └──────┬──────────────┬──────┘
//!                           │              │
//!              handle_response        handle_request
//!                           ▼              ▼
//!              ┌─────────────────┐  ┌─────────────────┐
//!              │ ExchangeCoord.  │  │ RequestResponder│
//!              └────────┬────────┘  └────────┬────────┘
//!                       │ issue / tick       │ publish
//!                       ▼                    ▼
//!              ┌─────────────────┐   ┌──────────────┐
//!              │ CorrelationTrk. │──►│  Transport   │
//!              └─────────────────┘   └──────────────┘
//! ```
//!
//! Stage payload bodies are produced and consumed through the
//! [`StagePayloads`] port; the coordinator never looks inside them.
//!
//! ## Invariants
//!
//! - A session only advances on a response for the stage it is awaiting,
//!   carrying the correlation id it issued. Anything else is ignored.
//! - A session never skips a stage; `ExchangeKind::next` is the only
//!   transition table.
//! - `Complete` and `Failed` are terminal. A terminal session ignores every
//!   later response and timeout until the peer is started again.

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::{BusRouter, DropReason, RouteOutcome};
pub use domain::{
    CompletedStage, CoordinatorConfig, ExchangeSession, FailureReason, SessionState, StepOutcome,
};
pub use error::{CoordinatorError, PayloadError};
pub use ports::{ExchangeObserver, NoopObserver, StagePayloads, StaticPayloads};
pub use service::{ExchangeCoordinator, RequestResponder, ResponderOutcome};
