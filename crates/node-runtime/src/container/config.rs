//! # Node Configuration
//!
//! The board configuration, built once at startup and immutable afterwards.
//! Defaults mirror the board's factory parameters; every field can be
//! overridden from the environment.
//!
//! ## Requirements
//!
//! - `board.uid` MUST be non-empty; it is the identity peers address
//! - The eight exchange topics MUST be valid and mutually distinct
//! - Timeouts and the tick interval MUST be non-zero

use km_01_topic_registry::{RegistryError, TopicRegistry};
use shared_types::{ExchangeKind, PeerId, TopicConfig};
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeConfig {
    /// Board identity.
    pub board: BoardConfig,
    /// Network credentials (carried, not used by the in-process transport).
    pub wifi: WifiConfig,
    /// MQTT broker endpoint.
    pub broker: BrokerConfig,
    /// Request/response topic pairs.
    pub topics: TopicConfig,
    /// Exchange timing.
    pub exchange: ExchangeConfig,
    /// Boards to start exchange sessions with at startup.
    pub peers: Vec<String>,
    /// Verbose logging switch.
    pub debug: bool,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}: invalid value '{value}': {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("board uid must not be empty")]
    EmptyBoardUid,

    #[error("broker port must not be zero")]
    ZeroBrokerPort,

    #[error("exchange {0} must not be zero")]
    ZeroDuration(&'static str),

    #[error("peer list contains this board's own uid '{0}'")]
    SelfPeer(String),

    #[error("topic registry misconfigured: {0}")]
    Topics(#[from] RegistryError),
}

/// Board identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    /// Unique id; the `sender`/`recipient` of every envelope.
    pub uid: String,
    /// Human-readable name.
    pub name: String,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            uid: "1234".to_string(),
            name: "myesp32".to_string(),
        }
    }
}

/// Wi-Fi credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct WifiConfig {
    pub ssid: String,
    pub password: String,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: "WIFI-SSID".to_string(),
            password: "WIFI-PASSWORD".to_string(),
        }
    }
}

impl fmt::Debug for WifiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WifiConfig")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// MQTT broker endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    pub address: String,
    pub port: u16,
    /// MQTT client id; defaults to `<name>-<uid>`.
    pub client_id: Option<String>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            address: "broker.hivemq.com".to_string(),
            port: 1883,
            client_id: None,
        }
    }
}

/// Exchange timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeConfig {
    /// Per-attempt request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Re-publishes per request before it times out.
    pub max_retries: u32,
    /// How often expired requests are checked, in milliseconds.
    pub tick_interval_ms: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            max_retries: 2,
            tick_interval_ms: 250,
        }
    }
}

impl ExchangeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Environment variable for each topic, in (kind, request var, response var)
/// form.
const TOPIC_VARS: [(ExchangeKind, &str, &str); 4] = [
    (
        ExchangeKind::PublicKey,
        "KM_TOPIC_PUBKEY_REQUEST",
        "KM_TOPIC_PUBKEY_RESPONSE",
    ),
    (
        ExchangeKind::Signature,
        "KM_TOPIC_SIGNATURE_REQUEST",
        "KM_TOPIC_SIGNATURE_RESPONSE",
    ),
    (
        ExchangeKind::Cek,
        "KM_TOPIC_CEK_REQUEST",
        "KM_TOPIC_CEK_RESPONSE",
    ),
    (
        ExchangeKind::DistributedPack,
        "KM_TOPIC_PACK_REQUEST",
        "KM_TOPIC_PACK_RESPONSE",
    ),
];

impl NodeConfig {
    /// Defaults overridden from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Defaults overridden from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidValue` for a numeric or boolean variable that
    /// does not parse.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(uid) = var("KM_BOARD_UID") {
            config.board.uid = uid;
        }
        if let Some(name) = var("KM_BOARD_NAME") {
            config.board.name = name;
        }
        if let Some(ssid) = var("KM_WIFI_SSID") {
            config.wifi.ssid = ssid;
        }
        if let Some(password) = var("KM_WIFI_PASSWORD") {
            config.wifi.password = password;
        }
        if let Some(address) = var("KM_BROKER_ADDRESS") {
            config.broker.address = address;
        }
        if let Some(port) = var("KM_BROKER_PORT") {
            config.broker.port = parse_number("KM_BROKER_PORT", port)?;
        }
        if let Some(client_id) = var("KM_BROKER_CLIENT_ID") {
            config.broker.client_id = Some(client_id);
        }

        for (kind, request_var, response_var) in TOPIC_VARS {
            let pair = config.topics.pair_mut(kind);
            if let Some(topic) = var(request_var) {
                pair.request = topic;
            }
            if let Some(topic) = var(response_var) {
                pair.response = topic;
            }
        }

        if let Some(ms) = var("KM_EXCHANGE_TIMEOUT_MS") {
            config.exchange.timeout_ms = parse_number("KM_EXCHANGE_TIMEOUT_MS", ms)?;
        }
        if let Some(retries) = var("KM_EXCHANGE_MAX_RETRIES") {
            config.exchange.max_retries = parse_number("KM_EXCHANGE_MAX_RETRIES", retries)?;
        }
        if let Some(ms) = var("KM_TICK_INTERVAL_MS") {
            config.exchange.tick_interval_ms = parse_number("KM_TICK_INTERVAL_MS", ms)?;
        }

        if let Some(peers) = var("KM_PEERS") {
            config.peers = peers
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(debug) = var("KM_DEBUG") {
            config.debug = parse_bool("KM_DEBUG", debug)?;
        }

        Ok(config)
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// Rejects an empty board uid, a zero broker port, zero timings, the
    /// board listing itself as a peer, and invalid or duplicated topics.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board.uid.trim().is_empty() {
            return Err(ConfigError::EmptyBoardUid);
        }
        if self.broker.port == 0 {
            return Err(ConfigError::ZeroBrokerPort);
        }
        if self.exchange.timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration("timeout"));
        }
        if self.exchange.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroDuration("tick interval"));
        }
        if let Some(own) = self.peers.iter().find(|p| **p == self.board.uid) {
            return Err(ConfigError::SelfPeer(own.clone()));
        }
        TopicRegistry::new(&self.topics)?;
        Ok(())
    }

    /// This board as a peer id.
    pub fn local_peer(&self) -> PeerId {
        PeerId::new(self.board.uid.clone())
    }

    /// Configured peers as peer ids.
    pub fn peer_ids(&self) -> Vec<PeerId> {
        self.peers.iter().map(|p| PeerId::new(p.clone())).collect()
    }

    /// Effective MQTT client id.
    pub fn client_id(&self) -> String {
        self.broker
            .client_id
            .clone()
            .unwrap_or_else(|| format!("{}-{}", self.board.name, self.board.uid))
    }
}

fn parse_number<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            var,
            reason: e.to_string(),
            value,
        })
}

fn parse_bool(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value,
            reason: "expected true/false or 1/0".to_string(),
        }),
    }
}
