//! AI21 output types for AWS Bedrock.
//!
//! Jamba streams OpenAI-style `choices[0].delta.content`. The older Jurassic completion shape,
//! a top-level `completion`, is read only from chunks without choices.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct JambaStreamChunk {
    #[serde(default)]
    choices: Vec<JambaChoice>,
    #[serde(default)]
    completion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JambaChoice {
    #[serde(default)]
    delta: Option<JambaDelta>,
}

#[derive(Debug, Deserialize)]
struct JambaDelta {
    #[serde(default)]
    content: Option<String>,
}

impl JambaStreamChunk {
    pub(crate) fn into_text(self) -> String {
        // a chunk with choices never falls back, even when its delta carries no content
        let Some(choice) = self.choices.into_iter().next() else {
            return self.completion.unwrap_or_default();
        };

        choice
            .delta
            .and_then(|delta| delta.content)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use crate::families::ModelFamily;

    #[test]
    fn choice_delta() {
        let frame = br#"{"id":"c1","choices":[{"index":0,"delta":{"content":"Hey"},"finish_reason":null}]}"#;
        assert_eq!(ModelFamily::AI21.decode_chunk(frame).into_text(), "Hey");
    }

    #[test]
    fn completion_fallback() {
        let frame = br#"{"completion":"legacy"}"#;
        assert_eq!(ModelFamily::AI21.decode_chunk(frame).into_text(), "legacy");
    }

    #[test]
    fn empty_delta_does_not_fall_back_to_completion() {
        let frame = br#"{"choices":[{"delta":{}}],"completion":"x"}"#;
        assert_eq!(ModelFamily::AI21.decode_chunk(frame).into_text(), "");
    }

    #[test]
    fn empty_choices_fall_back_to_completion() {
        let frame = br#"{"choices":[],"completion":"x"}"#;
        assert_eq!(ModelFamily::AI21.decode_chunk(frame).into_text(), "x");
    }
}
