use serde::Deserialize;

/// One streamed Titan chunk. The final chunk also carries completion metrics, ignored here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TitanStreamChunk {
    #[serde(default)]
    output_text: Option<String>,
}

impl TitanStreamChunk {
    pub(crate) fn into_text(self) -> String {
        self.output_text.unwrap_or_default()
    }
}
