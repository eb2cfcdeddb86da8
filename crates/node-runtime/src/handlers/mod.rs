//! # Handlers
//!
//! Long-running node tasks and the admin HTTP surface.

pub mod admin;
pub mod tick;

pub use admin::admin_router;
pub use tick::TickHandler;
