//! Amazon Titan text request types for AWS Bedrock.

use serde::Serialize;

use crate::families::PromptInput;

/// Request payload for Amazon Titan text models.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitanRequest {
    input_text: String,
    text_generation_config: TitanTextGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TitanTextGenerationConfig {
    max_token_count: u32,
    temperature: f32,
}

impl From<PromptInput<'_>> for TitanRequest {
    fn from(input: PromptInput<'_>) -> Self {
        Self {
            input_text: input.prompt.to_string(),
            text_generation_config: TitanTextGenerationConfig {
                max_token_count: input.sampling.max_tokens,
                temperature: input.sampling.temperature,
            },
        }
    }
}
