//! Relay configuration structures to map the relay.toml configuration.

#![deny(missing_docs)]

mod bedrock;
mod loader;
mod registry;
mod relay;
mod server;

use std::path::Path;

pub use bedrock::BedrockConfig;
pub use registry::{RedisConfig, RedisPoolConfig, RegistryConfig};
pub use relay::RelayConfig;
pub use server::{HealthConfig, ServerConfig};
use serde::Deserialize;

/// Main configuration structure for the relay.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP and WebSocket server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// AWS Bedrock client settings.
    #[serde(default)]
    pub bedrock: BedrockConfig,
    /// Streaming relay settings.
    #[serde(default)]
    pub relay: RelayConfig,
    /// Connection registry storage settings.
    #[serde(default)]
    pub registry: RegistryConfig,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
        loader::load(path)
    }

    /// Validates value ranges that serde cannot express.
    pub fn validate(&self) -> anyhow::Result<()> {
        loader::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use crate::Config;

    #[test]
    fn defaults() {
        let config: Config = toml::from_str("").unwrap();

        insta::assert_debug_snapshot!(&config, @r#"
        Config {
            server: ServerConfig {
                listen_address: None,
                path: "/ws",
                health: HealthConfig {
                    enabled: true,
                    path: "/health",
                },
            },
            bedrock: BedrockConfig {
                region: None,
                base_url: None,
                profile: None,
                access_key_id: None,
                secret_access_key: None,
                session_token: None,
            },
            relay: RelayConfig {
                default_model_id: "anthropic.claude-instant-v1",
                default_max_tokens: 256,
                default_temperature: 0.0,
                timeout: 900s,
                streaming_models: None,
            },
            registry: Memory,
        }
        "#);
    }

    #[test]
    fn all_values() {
        let config = indoc! {r#"
            [server]
            listen_address = "0.0.0.0:9000"
            path = "/chat"

            [server.health]
            enabled = false
            path = "/ping"

            [bedrock]
            region = "eu-central-1"
            base_url = "http://127.0.0.1:4566"
            profile = "dev"

            [relay]
            default_model_id = "amazon.nova-lite-v1:0"
            default_max_tokens = 512
            default_temperature = 0.5
            timeout = "30s"
            streaming_models = ["amazon.nova-lite-v1:0", "meta.llama3-2-1b-instruct-v1:0"]

            [registry]
            type = "redis"
            url = "redis://localhost:6379/1"
            key_prefix = "chat:connections:"
            ttl = "1h"
        "#};

        let config: Config = toml::from_str(config).unwrap();

        insta::assert_debug_snapshot!(&config, @r#"
        Config {
            server: ServerConfig {
                listen_address: Some(
                    0.0.0.0:9000,
                ),
                path: "/chat",
                health: HealthConfig {
                    enabled: false,
                    path: "/ping",
                },
            },
            bedrock: BedrockConfig {
                region: Some(
                    "eu-central-1",
                ),
                base_url: Some(
                    "http://127.0.0.1:4566",
                ),
                profile: Some(
                    "dev",
                ),
                access_key_id: None,
                secret_access_key: None,
                session_token: None,
            },
            relay: RelayConfig {
                default_model_id: "amazon.nova-lite-v1:0",
                default_max_tokens: 512,
                default_temperature: 0.5,
                timeout: 30s,
                streaming_models: Some(
                    [
                        "amazon.nova-lite-v1:0",
                        "meta.llama3-2-1b-instruct-v1:0",
                    ],
                ),
            },
            registry: Redis(
                RedisConfig {
                    url: "redis://localhost:6379/1",
                    pool: RedisPoolConfig {
                        max_size: Some(
                            16,
                        ),
                        timeout_create: Some(
                            5s,
                        ),
                        timeout_wait: Some(
                            5s,
                        ),
                        timeout_recycle: Some(
                            300s,
                        ),
                    },
                    key_prefix: "chat:connections:",
                    ttl: Some(
                        3600s,
                    ),
                },
            ),
        }
        "#);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let config = indoc! {r#"
            [relay]
            default_model = "anthropic.claude-v2"
        "#};

        let result = toml::from_str::<Config>(config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("unknown field `default_model`"));
    }
}
