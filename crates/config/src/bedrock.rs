//! AWS Bedrock client configuration.

use secrecy::SecretString;
use serde::Deserialize;

/// Region used when neither the configuration nor the environment names one.
const FALLBACK_REGION: &str = "us-east-1";

/// Configuration for the AWS Bedrock runtime client.
///
/// Credentials resolve in this order: explicit keys, a named profile, then the default AWS
/// credential chain (environment, shared files, instance roles).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BedrockConfig {
    /// AWS region hosting the models.
    pub region: Option<String>,
    /// Custom endpoint URL, for local mocks.
    pub base_url: Option<String>,
    /// AWS profile name (only used without explicit credentials).
    pub profile: Option<String>,
    /// AWS Access Key ID.
    pub access_key_id: Option<SecretString>,
    /// AWS Secret Access Key (required if access_key_id is provided).
    pub secret_access_key: Option<SecretString>,
    /// AWS Session Token for temporary credentials.
    pub session_token: Option<SecretString>,
}

impl BedrockConfig {
    /// The region to call, falling back to `AWS_REGION`, then `AWS_DEFAULT_REGION`, then `us-east-1`.
    pub fn resolved_region(&self) -> String {
        self.region
            .clone()
            .or_else(|| std::env::var("AWS_REGION").ok())
            .or_else(|| std::env::var("AWS_DEFAULT_REGION").ok())
            .unwrap_or_else(|| FALLBACK_REGION.to_string())
    }
}
