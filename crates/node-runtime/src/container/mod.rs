//! Node configuration and component wiring.

pub mod components;
pub mod config;

pub use components::KeyMeshContainer;
pub use config::{BoardConfig, BrokerConfig, ConfigError, ExchangeConfig, NodeConfig, WifiConfig};
