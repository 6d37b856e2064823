//! DeepSeek request types for AWS Bedrock.

use serde::Serialize;

use crate::families::{PromptInput, TextMessage};

/// Request payload for DeepSeek models, OpenAI-style like Jamba.
#[derive(Debug, Serialize)]
pub struct DeepSeekRequest {
    messages: Vec<TextMessage>,
    max_tokens: u32,
    temperature: f32,
}

impl From<PromptInput<'_>> for DeepSeekRequest {
    fn from(input: PromptInput<'_>) -> Self {
        Self {
            messages: vec![TextMessage::user(input.prompt)],
            max_tokens: input.sampling.max_tokens,
            temperature: input.sampling.temperature,
        }
    }
}
