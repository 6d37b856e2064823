//! The allow-list of models that may be invoked in streaming mode.

use std::collections::BTreeSet;

/// Models known to support response streaming on Bedrock.
const STREAMING_MODELS: &[&str] = &[
    // Amazon
    "amazon.nova-pro-v1:0",
    "amazon.nova-lite-v1:0",
    "amazon.nova-micro-v1:0",
    "amazon.titan-text-express-v1",
    "amazon.titan-text-express-v1:0:8k",
    "amazon.titan-text-lite-v1",
    "amazon.titan-text-lite-v1:0:4k",
    // Anthropic
    "anthropic.claude-sonnet-4-20250514-v1:0",
    "arn:aws:bedrock:eu-central-1:037708943013:inference-profile/eu.anthropic.claude-3-7-sonnet-20250219-v1:0",
    "anthropic.claude-3-5-sonnet-20240620-v1:0",
    "anthropic.claude-3-sonnet-20240229-v1:0",
    "anthropic.claude-3-haiku-20240307-v1:0",
    "anthropic.claude-v2:1:200k",
    "anthropic.claude-v2:1:18k",
    "anthropic.claude-v2:1",
    "anthropic.claude-v2",
    "anthropic.claude-instant-v1",
    // Meta
    "meta.llama3-2-3b-instruct-v1:0",
    "meta.llama3-2-1b-instruct-v1:0",
];

/// Membership test over streamable model identifiers. Matching is exact, no normalization.
#[derive(Debug, Clone)]
pub struct ProviderCatalog {
    models: BTreeSet<String>,
}

impl ProviderCatalog {
    /// Build a catalog from an explicit list of model identifiers.
    pub fn new<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            models: models.into_iter().map(Into::into).collect(),
        }
    }

    /// The catalog configured for this process: the configured list if present, the built-in one otherwise.
    pub fn from_config(models: Option<&[String]>) -> Self {
        match models {
            Some(models) => Self::new(models.iter().cloned()),
            None => Self::default(),
        }
    }

    /// Whether the model may be invoked in streaming mode.
    pub fn is_streamable(&self, model_id: &str) -> bool {
        self.models.contains(model_id)
    }

    /// All allowed model identifiers, in sorted order.
    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(String::as_str)
    }
}

impl Default for ProviderCatalog {
    fn default() -> Self {
        Self::new(STREAMING_MODELS.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        families::{ModelFamily, RequestPayload},
        params::Sampling,
    };

    #[test]
    fn exact_membership() {
        let catalog = ProviderCatalog::default();

        assert!(catalog.is_streamable("anthropic.claude-3-haiku-20240307-v1:0"));
        assert!(catalog.is_streamable("amazon.titan-text-lite-v1"));
        assert!(!catalog.is_streamable("anthropic.claude-3-haiku-20240307-v1"));
        assert!(!catalog.is_streamable("ANTHROPIC.CLAUDE-V2"));
        assert!(!catalog.is_streamable("mistral.unknown-v9"));
        assert!(!catalog.is_streamable(""));
    }

    #[test]
    fn every_builtin_model_builds_its_family_payload() {
        use ModelFamily::*;

        let expected = [
            ("amazon.nova-pro-v1:0", AmazonNova),
            ("amazon.nova-lite-v1:0", AmazonNova),
            ("amazon.nova-micro-v1:0", AmazonNova),
            ("amazon.titan-text-express-v1", AmazonTitan),
            ("amazon.titan-text-express-v1:0:8k", AmazonTitan),
            ("amazon.titan-text-lite-v1", AmazonTitan),
            ("amazon.titan-text-lite-v1:0:4k", AmazonTitan),
            // no messages marker in the id, so the completion body is used
            ("anthropic.claude-sonnet-4-20250514-v1:0", AnthropicLegacy),
            (
                "arn:aws:bedrock:eu-central-1:037708943013:inference-profile/eu.anthropic.claude-3-7-sonnet-20250219-v1:0",
                AnthropicMessages,
            ),
            ("anthropic.claude-3-5-sonnet-20240620-v1:0", AnthropicMessages),
            ("anthropic.claude-3-sonnet-20240229-v1:0", AnthropicMessages),
            ("anthropic.claude-3-haiku-20240307-v1:0", AnthropicMessages),
            ("anthropic.claude-v2:1:200k", AnthropicLegacy),
            ("anthropic.claude-v2:1:18k", AnthropicLegacy),
            ("anthropic.claude-v2:1", AnthropicLegacy),
            ("anthropic.claude-v2", AnthropicLegacy),
            ("anthropic.claude-instant-v1", AnthropicLegacy),
            ("meta.llama3-2-3b-instruct-v1:0", Meta),
            ("meta.llama3-2-1b-instruct-v1:0", Meta),
        ];

        let catalog = ProviderCatalog::default();
        assert_eq!(catalog.models().count(), expected.len());

        for (model_id, family) in expected {
            assert!(catalog.is_streamable(model_id), "{model_id} is not allow-listed");
            assert_eq!(ModelFamily::resolve(model_id).unwrap(), family, "{model_id}");

            let payload = family.build_request("hi", Sampling::default());

            let shape_matches = match family {
                AnthropicMessages => matches!(payload, RequestPayload::AnthropicMessages(_)),
                AnthropicLegacy => matches!(payload, RequestPayload::AnthropicLegacy(_)),
                AmazonNova => matches!(payload, RequestPayload::Nova(_)),
                AmazonTitan => matches!(payload, RequestPayload::Titan(_)),
                Meta => matches!(payload, RequestPayload::Llama(_)),
                Cohere | AI21 | DeepSeek => false,
            };

            assert!(shape_matches, "{model_id} built {payload:?}");
            assert!(payload.to_bytes().is_ok(), "{model_id} payload does not encode");
        }
    }

    #[test]
    fn configured_list_replaces_builtin() {
        let configured = vec!["cohere.command-r-v1:0".to_string()];
        let catalog = ProviderCatalog::from_config(Some(&configured));

        assert!(catalog.is_streamable("cohere.command-r-v1:0"));
        assert!(!catalog.is_streamable("anthropic.claude-v2"));
    }

    #[test]
    fn missing_configuration_uses_builtin() {
        let catalog = ProviderCatalog::from_config(None);
        assert_eq!(catalog.models().count(), STREAMING_MODELS.len());
    }
}
