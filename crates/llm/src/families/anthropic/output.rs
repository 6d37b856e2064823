//! Anthropic streaming chunk types for AWS Bedrock.
//!
//! Messages-API models stream typed events:
//! - `message_start`: beginning of a response
//! - `content_block_start`: start of a content block
//! - `content_block_delta`: incremental content tokens
//! - `content_block_stop`: end of a content block
//! - `message_delta`: usage statistics and stop reason
//! - `message_stop`: end of the response
//! - `ping`: keep-alive
//!
//! Only `content_block_delta` carries text. Legacy completion models stream `{"completion": ...}`.

use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
enum AnthropicEventType {
    MessageStart,
    ContentBlockStart,
    ContentBlockDelta,
    ContentBlockStop,
    MessageDelta,
    MessageStop,
    Ping,
    Error,
    /// Any other event type not yet known.
    #[serde(untagged)]
    Unknown(String),
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnthropicStreamChunk {
    #[serde(rename = "type")]
    event_type: AnthropicEventType,
    #[serde(default)]
    delta: Option<AnthropicDelta>,
}

#[derive(Debug, Deserialize)]
struct AnthropicDelta {
    // message_delta events carry a stop reason here instead of text
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicStreamChunk {
    pub(crate) fn into_text(self) -> String {
        match self.event_type {
            AnthropicEventType::ContentBlockDelta => self.delta.and_then(|delta| delta.text).unwrap_or_default(),
            AnthropicEventType::Error => {
                log::warn!("Bedrock Claude stream reported an error event");
                String::new()
            }
            AnthropicEventType::Unknown(event) => {
                log::debug!("Ignoring unknown Claude stream event: {event}");
                String::new()
            }
            AnthropicEventType::MessageStart
            | AnthropicEventType::ContentBlockStart
            | AnthropicEventType::ContentBlockStop
            | AnthropicEventType::MessageDelta
            | AnthropicEventType::MessageStop
            | AnthropicEventType::Ping => String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnthropicLegacyStreamChunk {
    #[serde(default)]
    completion: Option<String>,
}

impl AnthropicLegacyStreamChunk {
    pub(crate) fn into_text(self) -> String {
        self.completion.unwrap_or_default()
    }
}
