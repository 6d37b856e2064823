//! Model family detection and routing for AWS Bedrock models.
//!
//! AWS Bedrock hosts models from multiple vendors, each with different request and streamed
//! response formats. A [`ModelFamily`] pins down both shapes: the provider plus, for Anthropic and
//! Amazon, the sub-family whose payloads differ.

pub(crate) mod ai21;
pub(crate) mod amazon;
pub(crate) mod anthropic;
pub(crate) mod cohere;
pub(crate) mod deepseek;
pub(crate) mod meta;

use serde::{Deserialize, Serialize};

use crate::{error::LlmError, model::Provider, params::Sampling};

/// Version markers of Claude generations that use the messages API.
const CLAUDE_MESSAGES_MARKERS: [&str; 4] = ["claude-3", "claude-4", "claude-3.5", "claude-3.7"];

/// The request/response shape of a Bedrock model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    /// Claude 3 and later, messages API with `content_block_delta` stream events.
    AnthropicMessages,
    /// Claude 2 and Instant, single prompt with `completion` chunks.
    AnthropicLegacy,
    /// Amazon Nova, messages of content blocks.
    AmazonNova,
    /// Amazon Titan text, `inputText` with `outputText` chunks.
    AmazonTitan,
    /// Cohere Command, single `message` field.
    Cohere,
    /// Meta Llama, `prompt` with `generation` chunks.
    Meta,
    /// AI21 Jamba, OpenAI-style choices.
    AI21,
    /// DeepSeek, OpenAI-style choices.
    DeepSeek,
}

impl ModelFamily {
    /// Resolve the family of a model identifier.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::UnsupportedProvider`] with the provider token when the identifier does
    /// not belong to a provider with a known mapping.
    pub fn resolve(model_id: &str) -> crate::Result<Self> {
        let family = match Provider::from_model_id(model_id) {
            Provider::Anthropic if CLAUDE_MESSAGES_MARKERS.iter().any(|m| model_id.contains(m)) => {
                Self::AnthropicMessages
            }
            Provider::Anthropic => Self::AnthropicLegacy,
            Provider::Amazon if model_id.contains("nova") => Self::AmazonNova,
            Provider::Amazon => Self::AmazonTitan,
            Provider::Cohere => Self::Cohere,
            Provider::Meta => Self::Meta,
            Provider::AI21 => Self::AI21,
            Provider::DeepSeek => Self::DeepSeek,
            Provider::Unknown(token) => return Err(LlmError::UnsupportedProvider(token)),
        };

        Ok(family)
    }

    /// The provider this family belongs to.
    pub fn provider(&self) -> Provider {
        match self {
            Self::AnthropicMessages | Self::AnthropicLegacy => Provider::Anthropic,
            Self::AmazonNova | Self::AmazonTitan => Provider::Amazon,
            Self::Cohere => Provider::Cohere,
            Self::Meta => Provider::Meta,
            Self::AI21 => Provider::AI21,
            Self::DeepSeek => Provider::DeepSeek,
        }
    }

    /// Build the vendor request payload for a single user prompt.
    pub fn build_request(&self, prompt: &str, sampling: Sampling) -> RequestPayload {
        use ai21::input::JambaRequest;
        use amazon::{nova::input::NovaRequest, titan::input::TitanRequest};
        use anthropic::input::{AnthropicLegacyRequest, BedrockAnthropicRequest};
        use cohere::input::CohereRequest;
        use deepseek::input::DeepSeekRequest;
        use meta::input::LlamaRequest;

        let prompt = PromptInput { prompt, sampling };

        match self {
            Self::AnthropicMessages => RequestPayload::AnthropicMessages(BedrockAnthropicRequest::from(prompt)),
            Self::AnthropicLegacy => RequestPayload::AnthropicLegacy(AnthropicLegacyRequest::from(prompt)),
            Self::AmazonNova => RequestPayload::Nova(NovaRequest::from(prompt)),
            Self::AmazonTitan => RequestPayload::Titan(TitanRequest::from(prompt)),
            Self::Cohere => RequestPayload::Cohere(CohereRequest::from(prompt)),
            Self::Meta => RequestPayload::Llama(LlamaRequest::from(prompt)),
            Self::AI21 => RequestPayload::Jamba(JambaRequest::from(prompt)),
            Self::DeepSeek => RequestPayload::DeepSeek(DeepSeekRequest::from(prompt)),
        }
    }

    /// Decode one streamed frame and extract its text delta.
    ///
    /// Frames that are not JSON, or whose JSON does not fit the family's chunk shape, come back as
    /// [`ChunkOutcome::DecodeFailed`]. Recognised chunks without text yield an empty delta.
    pub fn decode_chunk(&self, frame: &[u8]) -> ChunkOutcome {
        use ai21::output::JambaStreamChunk;
        use amazon::{nova::output::NovaStreamChunk, titan::output::TitanStreamChunk};
        use anthropic::output::{AnthropicLegacyStreamChunk, AnthropicStreamChunk};
        use cohere::output::CohereStreamChunk;
        use deepseek::output::DeepSeekStreamChunk;
        use meta::output::LlamaStreamChunk;

        let text = match self {
            Self::AnthropicMessages => parse::<AnthropicStreamChunk>(frame).map(AnthropicStreamChunk::into_text),
            Self::AnthropicLegacy => {
                parse::<AnthropicLegacyStreamChunk>(frame).map(AnthropicLegacyStreamChunk::into_text)
            }
            Self::AmazonNova => parse::<NovaStreamChunk>(frame).map(NovaStreamChunk::into_text),
            Self::AmazonTitan => parse::<TitanStreamChunk>(frame).map(TitanStreamChunk::into_text),
            Self::Cohere => parse::<CohereStreamChunk>(frame).map(CohereStreamChunk::into_text),
            Self::Meta => parse::<LlamaStreamChunk>(frame).map(LlamaStreamChunk::into_text),
            Self::AI21 => parse::<JambaStreamChunk>(frame).map(JambaStreamChunk::into_text),
            Self::DeepSeek => parse::<DeepSeekStreamChunk>(frame).map(DeepSeekStreamChunk::into_text),
        };

        match text {
            Ok(text) => ChunkOutcome::Delta(text),
            Err(e) => ChunkOutcome::DecodeFailed(format!("{self:?} chunk did not decode: {e}")),
        }
    }
}

impl std::fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::AnthropicMessages => "anthropic (messages)",
            Self::AnthropicLegacy => "anthropic (legacy)",
            Self::AmazonNova => "amazon (nova)",
            Self::AmazonTitan => "amazon (titan)",
            Self::Cohere => "cohere",
            Self::Meta => "meta",
            Self::AI21 => "ai21",
            Self::DeepSeek => "deepseek",
        };

        f.write_str(name)
    }
}

fn parse<'a, T: Deserialize<'a>>(frame: &'a [u8]) -> sonic_rs::Result<T> {
    sonic_rs::from_slice(frame)
}

/// The prompt and settings every request payload is built from.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PromptInput<'a> {
    pub prompt: &'a str,
    pub sampling: Sampling,
}

/// Role of a message in a chat-style payload. Prompts always come from the user.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ChatRole {
    User,
}

/// A plain-text chat message, shared by the messages-style payloads.
#[derive(Debug, Serialize)]
pub struct TextMessage {
    role: ChatRole,
    content: String,
}

impl TextMessage {
    pub(crate) fn user(content: &str) -> Self {
        Self {
            role: ChatRole::User,
            content: content.to_string(),
        }
    }
}

/// A provider-specific request body.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RequestPayload {
    /// Claude messages API.
    AnthropicMessages(anthropic::input::BedrockAnthropicRequest),
    /// Claude text completions.
    AnthropicLegacy(anthropic::input::AnthropicLegacyRequest),
    /// Amazon Nova.
    Nova(amazon::nova::input::NovaRequest),
    /// Amazon Titan.
    Titan(amazon::titan::input::TitanRequest),
    /// Cohere Command.
    Cohere(cohere::input::CohereRequest),
    /// Meta Llama.
    Llama(meta::input::LlamaRequest),
    /// AI21 Jamba.
    Jamba(ai21::input::JambaRequest),
    /// DeepSeek.
    DeepSeek(deepseek::input::DeepSeekRequest),
}

impl RequestPayload {
    /// Encode the payload as the JSON body Bedrock expects.
    pub fn to_bytes(&self) -> crate::Result<Vec<u8>> {
        sonic_rs::to_vec(self).map_err(|e| {
            log::error!("Failed to serialize request payload: {e}");
            LlmError::Encoding(e.to_string())
        })
    }
}

/// Result of decoding one streamed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// The text carried by the chunk, possibly empty.
    Delta(String),
    /// The frame could not be decoded; it contributes no text.
    DecodeFailed(String),
}

impl ChunkOutcome {
    /// The delta text, empty for failed decodes.
    pub fn into_text(self) -> String {
        match self {
            Self::Delta(text) => text,
            Self::DecodeFailed(_) => String::new(),
        }
    }
}

/// Build the request payload for a model identifier.
///
/// # Errors
///
/// Returns [`LlmError::UnsupportedProvider`] for identifiers outside the supported providers.
pub fn build_request(model_id: &str, sampling: Sampling, prompt: &str) -> crate::Result<RequestPayload> {
    Ok(ModelFamily::resolve(model_id)?.build_request(prompt, sampling))
}

/// Extract the text delta from one streamed frame of a model's response.
///
/// Returns an empty string for unsupported providers and for frames that do not decode.
pub fn extract_text(model_id: &str, frame: &[u8]) -> String {
    match ModelFamily::resolve(model_id) {
        Ok(family) => family.decode_chunk(frame).into_text(),
        Err(_) => String::new(),
    }
}
