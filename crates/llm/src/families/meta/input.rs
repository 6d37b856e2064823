//! Meta Llama request types for AWS Bedrock.
//!
//! Llama on Bedrock takes a raw prompt string; the prompt is passed through without a chat
//! template.

use serde::Serialize;

use crate::families::PromptInput;

/// Request payload for Meta Llama models.
#[derive(Debug, Serialize)]
pub struct LlamaRequest {
    prompt: String,
    /// Maximum generation length in tokens.
    max_gen_len: u32,
    temperature: f32,
}

impl From<PromptInput<'_>> for LlamaRequest {
    fn from(input: PromptInput<'_>) -> Self {
        Self {
            prompt: input.prompt.to_string(),
            max_gen_len: input.sampling.max_tokens,
            temperature: input.sampling.temperature,
        }
    }
}
