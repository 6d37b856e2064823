//! Streaming inference relay for AWS Bedrock models.
//!
//! A [`Relay`] takes one prompt, picks the [`ModelFamily`] of the requested model, sends the
//! vendor-specific request through an [`InferenceBackend`] and forwards the decoded text deltas to
//! an [`OutputSink`] as they arrive.

mod backend;
mod catalog;
mod error;
mod families;
mod model;
mod params;
mod relay;
mod sink;

pub use backend::{BackendError, BedrockBackend, FrameStream, InferenceBackend};
pub use catalog::ProviderCatalog;
pub use error::LlmError;
pub use families::{ChunkOutcome, ModelFamily, RequestPayload, build_request, extract_text};
pub use model::Provider;
pub use params::{GenerationParameters, Sampling, SamplingParameters};
pub use relay::{END_OF_STREAM, Relay, RelayOutcome, RelayRequest};
pub use sink::{ConnectionId, OutputSink};

pub(crate) type Result<T> = std::result::Result<T, LlmError>;
