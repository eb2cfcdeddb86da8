//! # KM-02 Correlation Tracker
//!
//! Owns every in-flight exchange request and matches asynchronous responses
//! to them.
//!
//! ## Flow
//!
//! 1. Caller calls [`CorrelationTracker::issue`] for a (peer, kind)
//! 2. The tracker registers a `PendingRequest`, wraps the body in an
//!    `ExchangeEnvelope` carrying a fresh `CorrelationId`, and publishes it on
//!    the kind's request topic
//! 3. The bus router hands responses to [`CorrelationTracker::resolve`]
//! 4. A timer calls [`CorrelationTracker::tick`]; expired requests are
//!    re-published while retries remain, then reported as
//!    [`ExchangeTimedOut`]
//!
//! ## Invariants
//!
//! - **INVARIANT-1**: at most one pending request per (peer, kind). A second
//!   `issue` fails with `DuplicateInFlight`; it never overwrites.
//! - **INVARIANT-2**: `resolve` with an unknown correlation id never mutates
//!   state.
//! - **INVARIANT-3**: a request whose deadline passes with no retries left is
//!   removed exactly once and reported exactly once.
//!
//! ## Concurrency
//!
//! All operations are synchronous and non-blocking. The pending collection
//! and its (peer, kind) index sit behind one mutex, so `issue`, `resolve` and
//! `tick` serialize when called from several threads. Publishing happens
//! after the lock is released.

pub mod domain;
pub mod error;
pub mod service;

pub use domain::{ExchangeTimedOut, Resolution, RetryAttempt, TickReport, TrackerConfig};
pub use error::TrackerError;
pub use service::{CorrelationTracker, TrackerStats, TrackerStatsSnapshot};
