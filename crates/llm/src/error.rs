use std::time::Duration;

use http::StatusCode;
use thiserror::Error;

use crate::backend::BackendError;

/// Errors that end a relay invocation before it completes.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The model is not on the streaming allow-list.
    #[error("Model does not support streaming: {0}")]
    ModelNotStreamable(String),

    /// The model identifier names a provider without a request/response mapping.
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// The request payload could not be encoded.
    #[error("Failed to encode request body: {0}")]
    Encoding(String),

    /// The backend call could not be established, or its stream broke.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The invocation deadline expired before the stream finished.
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
}

impl LlmError {
    /// Get the status code reported for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ModelNotStreamable(_) | Self::UnsupportedProvider(_) => StatusCode::BAD_REQUEST,
            Self::Encoding(_) | Self::Backend(_) | Self::Timeout(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The explanatory string delivered to the client.
    ///
    /// Validation failures are shown as-is, processing failures get an `Error processing chat:` prefix.
    pub fn client_message(&self) -> String {
        if self.status_code().is_client_error() {
            self.to_string()
        } else {
            format!("Error processing chat: {self}")
        }
    }
}
