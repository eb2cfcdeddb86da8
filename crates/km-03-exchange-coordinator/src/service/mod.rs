//! Service Layer

pub mod coordinator;
pub mod responder;

pub use coordinator::ExchangeCoordinator;
pub use responder::{RequestResponder, ResponderOutcome};
