//! Streaming relay configuration.

use std::time::Duration;

use duration_str::deserialize_duration;
use serde::Deserialize;

/// Settings for each relay invocation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    /// Model used when the inbound parameters carry no `modelId`.
    pub default_model_id: String,
    /// `maxTokens` used when the inbound parameters omit it.
    pub default_max_tokens: u32,
    /// `temperature` used when the inbound parameters omit it.
    pub default_temperature: f32,
    /// Overall deadline for one invocation, backend call and stream consumption included.
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    /// Models accepted for streaming. Replaces the built-in list when set.
    pub streaming_models: Option<Vec<String>>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            default_model_id: "anthropic.claude-instant-v1".to_string(),
            default_max_tokens: 256,
            default_temperature: 0.0,
            timeout: Duration::from_secs(15 * 60),
            streaming_models: None,
        }
    }
}
