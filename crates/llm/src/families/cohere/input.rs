//! Cohere Command request types for AWS Bedrock.

use serde::Serialize;

use crate::families::PromptInput;

/// Request payload for Cohere Command-R models, a single chat `message`.
#[derive(Debug, Serialize)]
pub struct CohereRequest {
    message: String,
    max_tokens: u32,
    temperature: f32,
}

impl From<PromptInput<'_>> for CohereRequest {
    fn from(input: PromptInput<'_>) -> Self {
        Self {
            message: input.prompt.to_string(),
            max_tokens: input.sampling.max_tokens,
            temperature: input.sampling.temperature,
        }
    }
}
