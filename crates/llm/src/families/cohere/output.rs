//! Cohere output types for AWS Bedrock.
//!
//! Command-R streams `{"text": ...}` deltas. The older Command models stream
//! `{"generations": [{"text": ...}]}`, which is the fallback when `text` is empty or absent.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct CohereStreamChunk {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    generations: Vec<CohereGeneration>,
}

#[derive(Debug, Deserialize)]
struct CohereGeneration {
    #[serde(default)]
    text: Option<String>,
}

impl CohereStreamChunk {
    pub(crate) fn into_text(self) -> String {
        match self.text {
            Some(text) if !text.is_empty() => text,
            _ => self
                .generations
                .into_iter()
                .next()
                .and_then(|generation| generation.text)
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::families::ModelFamily;

    #[test]
    fn command_r_text() {
        let frame = br#"{"is_finished":false,"event_type":"text-generation","text":"Hi"}"#;
        assert_eq!(ModelFamily::Cohere.decode_chunk(frame).into_text(), "Hi");
    }

    #[test]
    fn empty_text_falls_back_to_generations() {
        let frame = br#"{"text":"","generations":[{"text":"there"}]}"#;
        assert_eq!(ModelFamily::Cohere.decode_chunk(frame).into_text(), "there");
    }

    #[test]
    fn stream_end_is_empty() {
        let frame = br#"{"is_finished":true,"event_type":"stream-end","finish_reason":"COMPLETE"}"#;
        assert_eq!(ModelFamily::Cohere.decode_chunk(frame).into_text(), "");
    }
}
