//! Generation parameters sent by clients along with a prompt.

use serde::Deserialize;

/// Parameters as they arrive from the client.
///
/// `modelId` selects the backend model and is split off before the request payload is built,
/// see [`GenerationParameters::split_model_id`]. No bounds are enforced on `maxTokens` or
/// `temperature`; the backend rejects values it cannot serve.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParameters {
    /// Backend model identifier.
    #[serde(default)]
    pub model_id: Option<String>,
    /// Upper bound on generated tokens.
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl GenerationParameters {
    /// Separate the model identifier from the parameters that shape the request payload.
    pub fn split_model_id(self) -> (Option<String>, SamplingParameters) {
        let sampling = SamplingParameters {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        (self.model_id, sampling)
    }
}

/// The parameters that end up in the request payload, before defaults apply.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SamplingParameters {
    /// Upper bound on generated tokens.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
}

impl SamplingParameters {
    /// Fill missing values from `defaults`.
    pub fn resolve(&self, defaults: Sampling) -> Sampling {
        Sampling {
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.temperature.unwrap_or(defaults.temperature),
        }
    }
}

/// Fully resolved sampling settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            max_tokens: 256,
            temperature: 0.0,
        }
    }
}
