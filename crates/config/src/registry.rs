//! Connection registry storage configuration.

use std::time::Duration;

use duration_str::deserialize_option_duration;
use serde::Deserialize;

/// Where connection records are kept.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RegistryConfig {
    /// In-process storage (default).
    #[default]
    Memory,
    /// Redis storage with configuration.
    Redis(Box<RedisConfig>),
}

/// Redis registry configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedisConfig {
    /// Redis connection URL (redis:// or rediss:// for TLS).
    pub url: String,
    /// Connection pool configuration.
    #[serde(default)]
    pub pool: RedisPoolConfig,
    /// Key prefix for all connection records.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Expiry for records whose disconnect was never observed.
    #[serde(default = "default_ttl", deserialize_with = "deserialize_option_duration")]
    pub ttl: Option<Duration>,
}

fn default_key_prefix() -> String {
    "relay:connection:".to_string()
}

fn default_ttl() -> Option<Duration> {
    // WebSocket connections behind managed gateways live at most two hours.
    Some(Duration::from_secs(2 * 60 * 60))
}

/// Redis connection pool configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RedisPoolConfig {
    /// Maximum number of connections.
    pub max_size: Option<usize>,
    /// Timeout for creating connections.
    #[serde(deserialize_with = "deserialize_option_duration")]
    pub timeout_create: Option<Duration>,
    /// Timeout for waiting for a connection.
    #[serde(deserialize_with = "deserialize_option_duration")]
    pub timeout_wait: Option<Duration>,
    /// Timeout before recycling idle connections.
    #[serde(deserialize_with = "deserialize_option_duration")]
    pub timeout_recycle: Option<Duration>,
}

impl Default for RedisPoolConfig {
    fn default() -> Self {
        Self {
            max_size: Some(16),
            timeout_create: Some(Duration::from_secs(5)),
            timeout_wait: Some(Duration::from_secs(5)),
            timeout_recycle: Some(Duration::from_secs(300)),
        }
    }
}
