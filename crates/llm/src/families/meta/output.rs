//! Meta Llama output types for AWS Bedrock.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct LlamaStreamChunk {
    #[serde(default)]
    generation: Option<String>,
}

impl LlamaStreamChunk {
    pub(crate) fn into_text(self) -> String {
        self.generation.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use crate::families::ModelFamily;

    #[test]
    fn generation() {
        let frame = br#"{"generation":" world","prompt_token_count":null,"generation_token_count":2,"stop_reason":null}"#;
        assert_eq!(ModelFamily::Meta.decode_chunk(frame).into_text(), " world");
    }
}
