//! HTTP and WebSocket server configuration settings.

use std::{borrow::Cow, net::SocketAddr};

use serde::Deserialize;

/// HTTP and WebSocket server configuration settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// The socket address the server should listen on.
    pub listen_address: Option<SocketAddr>,
    /// The path clients upgrade to a WebSocket connection on.
    pub path: Cow<'static, str>,
    /// Health endpoint configuration.
    pub health: HealthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: None,
            path: Cow::Borrowed("/ws"),
            health: HealthConfig::default(),
        }
    }
}

/// Health endpoint configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HealthConfig {
    /// Whether the health endpoint is enabled.
    pub enabled: bool,
    /// The path for the health endpoint.
    pub path: Cow<'static, str>,
}

impl Default for HealthConfig {
    fn default() -> Self {
        HealthConfig {
            enabled: true,
            path: Cow::Borrowed("/health"),
        }
    }
}
