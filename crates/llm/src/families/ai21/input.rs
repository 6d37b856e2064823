//! AI21 Jamba request types for AWS Bedrock.
//!
//! Jamba accepts an OpenAI-style chat body.

use serde::Serialize;

use crate::families::{PromptInput, TextMessage};

/// Request payload for AI21 Jamba models.
#[derive(Debug, Serialize)]
pub struct JambaRequest {
    messages: Vec<TextMessage>,
    max_tokens: u32,
    temperature: f32,
}

impl From<PromptInput<'_>> for JambaRequest {
    fn from(input: PromptInput<'_>) -> Self {
        Self {
            messages: vec![TextMessage::user(input.prompt)],
            max_tokens: input.sampling.max_tokens,
            temperature: input.sampling.temperature,
        }
    }
}
