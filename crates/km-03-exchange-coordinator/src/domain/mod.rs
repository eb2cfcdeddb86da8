//! Domain Layer
//!
//! Session state machine and the values coordinator operations return.
//!
//! RULES:
//! - No I/O operations
//! - No async code

pub mod config;
pub mod session;
pub mod state;

pub use config::CoordinatorConfig;
pub use session::{CompletedStage, ExchangeSession, FailureReason, StepOutcome};
pub use state::SessionState;
