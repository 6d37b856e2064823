//! Amazon Nova request types for AWS Bedrock.

use serde::Serialize;

use crate::families::{ChatRole, PromptInput};

/// Request payload for Amazon Nova models.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NovaRequest {
    messages: Vec<NovaMessage>,
    inference_config: NovaInferenceConfig,
}

#[derive(Debug, Serialize)]
struct NovaMessage {
    role: ChatRole,
    content: Vec<NovaContentBlock>,
}

/// Nova content is a list of blocks; prompts are a single text block.
#[derive(Debug, Serialize)]
struct NovaContentBlock {
    text: String,
}

#[derive(Debug, Serialize)]
struct NovaInferenceConfig {
    max_new_tokens: u32,
    temperature: f32,
}

impl From<PromptInput<'_>> for NovaRequest {
    fn from(input: PromptInput<'_>) -> Self {
        Self {
            messages: vec![NovaMessage {
                role: ChatRole::User,
                content: vec![NovaContentBlock {
                    text: input.prompt.to_string(),
                }],
            }],
            inference_config: NovaInferenceConfig {
                max_new_tokens: input.sampling.max_tokens,
                temperature: input.sampling.temperature,
            },
        }
    }
}
