//! Domain Layer - pure lookup logic, no I/O.

pub mod registry;

pub use registry::TopicRegistry;
