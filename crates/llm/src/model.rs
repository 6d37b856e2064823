//! Provider detection from Bedrock model identifiers.
//!
//! Model identifiers come in two shapes:
//!
//! - plain model IDs, `<provider>.<model-name>-<version>`, e.g. `anthropic.claude-3-haiku-20240307-v1:0`
//! - inference profile ARNs, `arn:aws:bedrock:<region>:<account>:inference-profile/<geo>.<provider>.<model>`,
//!   where the provider is the second dot-separated token of the last path segment

use std::fmt;

/// Prefix marking an inference profile ARN.
const PROFILE_ARN_PREFIX: &str = "arn:aws:bedrock";

/// The vendor family a model identifier belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    /// Anthropic Claude models.
    Anthropic,
    /// Amazon Nova and Titan models.
    Amazon,
    /// Cohere Command models.
    Cohere,
    /// Meta Llama models.
    Meta,
    /// AI21 Labs Jamba models.
    AI21,
    /// DeepSeek models.
    DeepSeek,
    /// Any other token, kept for error reporting.
    Unknown(String),
}

impl Provider {
    /// Derive the provider from a model identifier. Never fails: unrecognised tokens map to
    /// [`Provider::Unknown`].
    pub fn from_model_id(model_id: &str) -> Self {
        match provider_token(model_id) {
            "anthropic" => Self::Anthropic,
            "amazon" => Self::Amazon,
            "cohere" => Self::Cohere,
            "meta" => Self::Meta,
            "ai21" => Self::AI21,
            "deepseek" => Self::DeepSeek,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// The token used in model identifiers for this provider.
    pub fn token(&self) -> &str {
        match self {
            Self::Anthropic => "anthropic",
            Self::Amazon => "amazon",
            Self::Cohere => "cohere",
            Self::Meta => "meta",
            Self::AI21 => "ai21",
            Self::DeepSeek => "deepseek",
            Self::Unknown(token) => token,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Extract the raw provider token from a model identifier.
fn provider_token(model_id: &str) -> &str {
    if model_id.starts_with(PROFILE_ARN_PREFIX) {
        // `.../eu.anthropic.claude-3-7-sonnet-20250219-v1:0` -> `anthropic`
        return match model_id.rsplit_once('/') {
            Some((_, profile)) => profile.split('.').nth(1).unwrap_or("unknown"),
            None => "unknown",
        };
    }

    model_id.split('.').next().unwrap_or(model_id)
}
