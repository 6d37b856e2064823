use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct DeepSeekStreamChunk {
    #[serde(default)]
    choices: Vec<DeepSeekChoice>,
}

#[derive(Debug, Deserialize)]
struct DeepSeekChoice {
    #[serde(default)]
    delta: Option<DeepSeekDelta>,
}

#[derive(Debug, Deserialize)]
struct DeepSeekDelta {
    #[serde(default)]
    content: Option<String>,
}

impl DeepSeekStreamChunk {
    pub(crate) fn into_text(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta)
            .and_then(|delta| delta.content)
            .unwrap_or_default()
    }
}
