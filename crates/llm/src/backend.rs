//! The streaming inference backend seam.

mod bedrock;

use std::pin::Pin;

use async_trait::async_trait;
use aws_sdk_bedrockruntime::error::ProvideErrorMetadata;
use aws_smithy_runtime_api::client::result::SdkError;
use futures::Stream;
use thiserror::Error;

pub use bedrock::BedrockBackend;

/// Raw frames of a streamed response, one JSON document each, in arrival order.
///
/// A stream ends after yielding its first error.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, BackendError>> + Send>>;

/// A model runtime that can stream a response for an encoded request body.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Open a response stream for `model_id` with the given JSON request body.
    async fn invoke_stream(&self, model_id: &str, body: Vec<u8>) -> Result<FrameStream, BackendError>;
}

/// Failures reported by the backend, either while opening the stream or while reading it.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Request throttled: {0}")]
    Throttled(String),

    #[error("Service quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

/// Map AWS SDK errors by the service error code.
impl<E, R> From<SdkError<E, R>> for BackendError
where
    E: ProvideErrorMetadata + std::fmt::Display + std::fmt::Debug,
    R: std::fmt::Debug,
{
    fn from(err: SdkError<E, R>) -> Self {
        log::error!("AWS Bedrock API error: {err}");
        log::debug!("AWS Bedrock error details: {err:?}");

        let SdkError::ServiceError(service_err) = &err else {
            // dispatch failures, timeouts and unparseable responses
            return Self::Connection(err.to_string());
        };

        let message = service_err.err().message().unwrap_or("no message").to_string();

        match service_err.err().code() {
            Some("ValidationException") => Self::InvalidRequest(message),
            Some("ResourceNotFoundException") => Self::ModelNotFound(message),
            Some("AccessDeniedException") => Self::AccessDenied(message),
            Some("ThrottlingException") => Self::Throttled(message),
            Some("ServiceQuotaExceededException") => Self::QuotaExceeded(message),
            Some("InternalServerException" | "ModelStreamErrorException" | "ModelErrorException") => {
                Self::Provider(message)
            }
            _ => Self::Connection(err.to_string()),
        }
    }
}
