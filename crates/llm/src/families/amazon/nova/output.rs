//! Amazon Nova streaming chunk types for AWS Bedrock.
//!
//! Nova streams converse-style events; text arrives as `contentBlockDelta.delta.text`. Some
//! profiles emit the Titan-like `outputText` instead, which is used as a fallback.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NovaStreamChunk {
    #[serde(default)]
    content_block_delta: Option<NovaContentBlockDelta>,
    #[serde(default)]
    output_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NovaContentBlockDelta {
    #[serde(default)]
    delta: Option<NovaDelta>,
}

#[derive(Debug, Deserialize)]
struct NovaDelta {
    #[serde(default)]
    text: Option<String>,
}

impl NovaStreamChunk {
    pub(crate) fn into_text(self) -> String {
        self.content_block_delta
            .and_then(|block| block.delta)
            .and_then(|delta| delta.text)
            .or(self.output_text)
            .unwrap_or_default()
    }
}
