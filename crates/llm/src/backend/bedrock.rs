//! AWS Bedrock runtime backend.

use async_trait::async_trait;
use aws_config::Region;
use aws_credential_types::Credentials;
use aws_sdk_bedrockruntime::{
    Client as BedrockRuntimeClient,
    operation::invoke_model_with_response_stream::InvokeModelWithResponseStreamOutput, types::ResponseStream,
};
use aws_smithy_types::Blob;
use config::BedrockConfig;
use futures::stream;
use secrecy::ExposeSecret;
use tokio::sync::OnceCell;

use super::{BackendError, FrameStream, InferenceBackend};

const JSON_CONTENT_TYPE: &str = "application/json";

/// Streams model responses through `InvokeModelWithResponseStream`.
///
/// The runtime client is built on first use and shared by every invocation afterwards.
/// Concurrent first calls initialise it once.
pub struct BedrockBackend {
    config: BedrockConfig,
    client: OnceCell<BedrockRuntimeClient>,
}

impl BedrockBackend {
    pub fn new(config: BedrockConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> &BedrockRuntimeClient {
        self.client
            .get_or_init(|| async {
                let sdk_config = create_aws_config(&self.config).await;
                log::debug!("Initialised Bedrock runtime client for region {:?}", sdk_config.region());

                BedrockRuntimeClient::new(&sdk_config)
            })
            .await
    }
}

#[async_trait]
impl InferenceBackend for BedrockBackend {
    async fn invoke_stream(&self, model_id: &str, body: Vec<u8>) -> Result<FrameStream, BackendError> {
        log::debug!("Invoking Bedrock model {model_id} with a streamed response");

        let output = self
            .client()
            .await
            .invoke_model_with_response_stream()
            .model_id(model_id)
            .content_type(JSON_CONTENT_TYPE)
            .accept(JSON_CONTENT_TYPE)
            .body(Blob::new(body))
            .send()
            .await?;

        Ok(frame_stream(output))
    }
}

/// Turn the event receiver into a stream of chunk payloads.
///
/// Events other than chunks carry no model output and are skipped. The stream stops after the first
/// receive error.
fn frame_stream(output: InvokeModelWithResponseStreamOutput) -> FrameStream {
    Box::pin(stream::unfold(Some(output.body), |receiver| async move {
        let mut receiver = receiver?;

        loop {
            match receiver.recv().await {
                Ok(Some(ResponseStream::Chunk(part))) => {
                    let frame = part.bytes.map(Blob::into_inner).unwrap_or_default();
                    return Some((Ok(frame), Some(receiver)));
                }
                Ok(Some(event)) => {
                    log::debug!("Skipping non-chunk Bedrock stream event: {event:?}");
                }
                Ok(None) => return None,
                Err(e) => {
                    log::error!("Error receiving from Bedrock stream: {e}");
                    return Some((Err(BackendError::from(e)), None));
                }
            }
        }
    }))
}

/// Create the AWS SDK configuration.
///
/// Credentials resolve in this order:
/// 1. Explicit credentials from config (access_key_id + secret_access_key)
/// 2. AWS profile specified in config
/// 3. Default AWS credential chain (env vars, files, IAM, etc.)
async fn create_aws_config(config: &BedrockConfig) -> aws_config::SdkConfig {
    let mut builder = aws_config::from_env().region(Region::new(config.resolved_region()));

    if let Some(endpoint_url) = &config.base_url {
        log::debug!("Using custom Bedrock endpoint: {endpoint_url}");
        builder = builder.endpoint_url(endpoint_url);
    }

    if let (Some(access_key_id), Some(secret_access_key)) = (&config.access_key_id, &config.secret_access_key) {
        builder = builder.credentials_provider(Credentials::new(
            access_key_id.expose_secret(),
            secret_access_key.expose_secret(),
            config.session_token.as_ref().map(|t| t.expose_secret().to_string()),
            None,
            "relay-bedrock",
        ));
    } else if let Some(profile) = &config.profile {
        builder = builder.profile_name(profile);
    }

    builder.load().await
}
