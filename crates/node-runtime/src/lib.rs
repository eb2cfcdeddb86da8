//! # KeyMesh Node Runtime
//!
//! Wires one board's exchange components to a transport and runs them.
//! The `node-runtime` binary is a thin shell around [`NodeRuntime`].
//!
//! ## Modules
//!
//! - `container/` - configuration and component wiring
//! - `adapters/` - board payloads and the metrics observer
//! - `handlers/` - timeout ticker and admin HTTP router
//!
//! ## Tasks
//!
//! ```text
//! transport ──► BusRouter::run ──► coordinator / responder
//!                                       ▲
//! TickHandler::run ─── tick(now) ───────┘
//! admin server  ───── /health /metrics /sessions /pending
//! ```

pub mod adapters;
pub mod container;
pub mod handlers;
mod runtime;

pub use container::{ConfigError, KeyMeshContainer, NodeConfig};
pub use runtime::NodeRuntime;
