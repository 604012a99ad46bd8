use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

/// Root configuration for relayd
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Broker request/reply channel
    #[serde(default)]
    pub broker: BrokerConfig,

    /// HTTP API (status endpoints and WebSocket subscribe)
    #[serde(default)]
    pub api: ApiConfig,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// Broker channel configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// Bind address for the request/reply endpoint
    #[serde(default = "default_broker_address")]
    pub address: SocketAddr,

    /// Maximum accepted request line length in bytes
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            address: default_broker_address(),
            max_line_bytes: default_max_line_bytes(),
        }
    }
}

fn default_broker_address() -> SocketAddr {
    "127.0.0.1:5555".parse().unwrap()
}

fn default_max_line_bytes() -> usize {
    64 * 1024
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Bind address for the HTTP API
    #[serde(default = "default_api_address")]
    pub address: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            address: default_api_address(),
        }
    }
}

fn default_api_address() -> SocketAddr {
    "127.0.0.1:8001".parse().unwrap()
}

/// Global settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Enable structured JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Shutdown configuration
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            json_logs: false,
            log_level: default_log_level(),
            shutdown: ShutdownConfig::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Shutdown configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ShutdownConfig {
    /// Drain timeout - how long to wait for listener sessions to unwind
    #[serde(default = "default_drain_timeout", with = "humantime_serde")]
    pub drain_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout: default_drain_timeout(),
        }
    }
}

fn default_drain_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Humantime serde support module
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
