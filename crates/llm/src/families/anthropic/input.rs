//! Anthropic request types for AWS Bedrock.
//!
//! Claude 3 and later take the messages API body with a mandatory `anthropic_version` and no
//! `model` field, since the model is named in the Bedrock call itself. Claude 2 and Instant
//! take a bare text completion body.
//!
//! # Request Format
//! ```json
//! {
//!   "anthropic_version": "bedrock-2023-05-31",
//!   "max_tokens": 256,
//!   "messages": [{"role": "user", "content": "Hello!"}],
//!   "temperature": 0.0
//! }
//! ```

use serde::Serialize;

use crate::families::{PromptInput, TextMessage};

/// Version string Bedrock requires on every Claude messages request.
const BEDROCK_ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Request payload for Claude messages-API models on AWS Bedrock.
#[derive(Debug, Serialize)]
pub struct BedrockAnthropicRequest {
    /// The Anthropic API version. Bedrock only accepts `bedrock-2023-05-31`.
    anthropic_version: &'static str,

    /// The maximum number of tokens to generate before stopping.
    max_tokens: u32,

    /// The conversation, a single user turn here.
    messages: Vec<TextMessage>,

    /// Amount of randomness injected into the response.
    temperature: f32,
}

impl From<PromptInput<'_>> for BedrockAnthropicRequest {
    fn from(input: PromptInput<'_>) -> Self {
        Self {
            anthropic_version: BEDROCK_ANTHROPIC_VERSION,
            max_tokens: input.sampling.max_tokens,
            messages: vec![TextMessage::user(input.prompt)],
            temperature: input.sampling.temperature,
        }
    }
}

/// Request payload for the Claude text completions API (Claude 2, Claude Instant).
#[derive(Debug, Serialize)]
pub struct AnthropicLegacyRequest {
    prompt: String,
    max_tokens_to_sample: u32,
    temperature: f32,
}

impl From<PromptInput<'_>> for AnthropicLegacyRequest {
    fn from(input: PromptInput<'_>) -> Self {
        Self {
            prompt: input.prompt.to_string(),
            max_tokens_to_sample: input.sampling.max_tokens,
            temperature: input.sampling.temperature,
        }
    }
}
