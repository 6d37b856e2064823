//! The streaming relay: one prompt in, text deltas out to one connection.
//!
//! An invocation validates the model, builds the vendor payload, opens the backend stream and
//! forwards every non-empty delta as soon as it is decoded. Undecodable chunks are logged and
//! skipped. The first failed send marks the connection as lost; the stream is still consumed to the
//! end so the accumulated text stays complete. A live connection receives [`END_OF_STREAM`] once
//! the stream finishes.

use std::{sync::Arc, time::Duration};

use config::RelayConfig;
use futures::StreamExt;
use http::StatusCode;
use tokio::time::{Instant, timeout_at};

use crate::{
    backend::InferenceBackend,
    catalog::ProviderCatalog,
    error::LlmError,
    families::{ChunkOutcome, ModelFamily},
    params::{GenerationParameters, Sampling, SamplingParameters},
    sink::{ConnectionId, OutputSink},
};

/// Sent after the last delta of a completed response.
pub const END_OF_STREAM: &str = "<End of LLM response>";

/// One invocation's input, with the model identifier split off the sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayRequest {
    pub model_id: String,
    pub parameters: SamplingParameters,
    pub prompt: String,
}

impl RelayRequest {
    /// Build a request from client parameters, using `default_model_id` when they name no model.
    pub fn new(prompt: impl Into<String>, parameters: GenerationParameters, default_model_id: &str) -> Self {
        let (model_id, parameters) = parameters.split_model_id();

        Self {
            model_id: model_id.unwrap_or_else(|| default_model_id.to_string()),
            parameters,
            prompt: prompt.into(),
        }
    }
}

/// How an invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    /// 200 on completion, otherwise the status of the failure.
    pub status: StatusCode,
    /// The concatenation of all deltas, present only on completion.
    pub full_text: Option<String>,
}

impl RelayOutcome {
    fn completed(full_text: String) -> Self {
        Self {
            status: StatusCode::OK,
            full_text: Some(full_text),
        }
    }

    fn failed(status: StatusCode) -> Self {
        Self { status, full_text: None }
    }

    pub fn is_completed(&self) -> bool {
        self.status == StatusCode::OK
    }
}

/// Runs streaming invocations against one backend.
#[derive(Clone)]
pub struct Relay {
    catalog: Arc<ProviderCatalog>,
    backend: Arc<dyn InferenceBackend>,
    defaults: Sampling,
    default_model_id: String,
    timeout: Duration,
}

impl Relay {
    pub fn new(config: &RelayConfig, backend: Arc<dyn InferenceBackend>) -> Self {
        let catalog = ProviderCatalog::from_config(config.streaming_models.as_deref());
        log::debug!("{} models enabled for streaming", catalog.models().count());

        Self {
            catalog: Arc::new(catalog),
            backend,
            defaults: Sampling {
                max_tokens: config.default_max_tokens,
                temperature: config.default_temperature,
            },
            default_model_id: config.default_model_id.clone(),
            timeout: config.timeout,
        }
    }

    /// Replace the streaming allow-list.
    pub fn with_catalog(mut self, catalog: ProviderCatalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    /// Build a request for this relay, filling in the default model.
    pub fn request(&self, prompt: impl Into<String>, parameters: GenerationParameters) -> RelayRequest {
        RelayRequest::new(prompt, parameters, &self.default_model_id)
    }

    /// Run one invocation to the end, streaming its output to `connection` through `sink`.
    ///
    /// Failures are reported to the connection as a single message while it is still reachable,
    /// and in the returned status.
    pub async fn run(&self, connection: &ConnectionId, sink: &dyn OutputSink, request: RelayRequest) -> RelayOutcome {
        log::debug!(
            "Relaying prompt of {} bytes to {connection} via {}",
            request.prompt.len(),
            request.model_id
        );

        let mut forwarder = Forwarder::new(connection, sink);

        match self.stream(&request, &mut forwarder).await {
            Ok(()) => {
                forwarder.notify(END_OF_STREAM).await;
                log::debug!("Completed response from {} for {connection}", request.model_id);

                RelayOutcome::completed(forwarder.into_text())
            }
            Err(error) => {
                let status = error.status_code();

                if status.is_server_error() {
                    log::error!("Relay for {connection} failed: {error}");
                } else {
                    log::warn!("Rejected request from {connection}: {error}");
                }

                forwarder.notify(&error.client_message()).await;

                RelayOutcome::failed(status)
            }
        }
    }

    fn prepare(&self, request: &RelayRequest) -> crate::Result<(ModelFamily, Vec<u8>)> {
        if !self.catalog.is_streamable(&request.model_id) {
            return Err(LlmError::ModelNotStreamable(request.model_id.clone()));
        }

        let family = ModelFamily::resolve(&request.model_id)?;
        let sampling = request.parameters.resolve(self.defaults);
        let body = family.build_request(&request.prompt, sampling).to_bytes()?;

        log::debug!("Using {} model family {family} for {}", family.provider(), request.model_id);

        Ok((family, body))
    }

    async fn stream(&self, request: &RelayRequest, forwarder: &mut Forwarder<'_>) -> crate::Result<()> {
        let (family, body) = self.prepare(request)?;
        let deadline = Instant::now() + self.timeout;

        let mut frames = timeout_at(deadline, self.backend.invoke_stream(&request.model_id, body))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout))??;

        loop {
            let frame = match timeout_at(deadline, frames.next()).await {
                Ok(Some(frame)) => frame?,
                Ok(None) => break,
                Err(_) => return Err(LlmError::Timeout(self.timeout)),
            };

            log::debug!("Received chunk from {}: {}", request.model_id, String::from_utf8_lossy(&frame));

            match family.decode_chunk(&frame) {
                ChunkOutcome::Delta(text) => {
                    log::debug!("Extracted text: {text:?}");
                    forwarder.forward(text).await
                }
                ChunkOutcome::DecodeFailed(reason) => {
                    log::error!("Skipping chunk from {}: {reason}", request.model_id);
                }
            }
        }

        Ok(())
    }
}

/// Delivery state of one invocation. The connection counts as alive until a send fails.
struct Forwarder<'a> {
    connection: &'a ConnectionId,
    sink: &'a dyn OutputSink,
    accumulated: String,
    alive: bool,
}

impl<'a> Forwarder<'a> {
    fn new(connection: &'a ConnectionId, sink: &'a dyn OutputSink) -> Self {
        Self {
            connection,
            sink,
            accumulated: String::new(),
            alive: true,
        }
    }

    async fn forward(&mut self, delta: String) {
        if delta.is_empty() {
            return;
        }

        self.notify(&delta).await;
        self.accumulated.push_str(&delta);
    }

    async fn notify(&mut self, message: &str) {
        if !self.alive {
            return;
        }

        if !self.sink.send(self.connection, message).await {
            log::warn!("Connection {} is gone, no further output will be sent", self.connection);
            self.alive = false;
        }
    }

    fn into_text(self) -> String {
        self.accumulated
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use futures::stream;

    use super::*;
    use crate::backend::{BackendError, FrameStream};

    const HAIKU: &str = "anthropic.claude-3-haiku-20240307-v1:0";

    enum Script {
        Frames(Vec<Result<Vec<u8>, BackendError>>),
        Refuse(BackendError),
        Stall(Vec<Vec<u8>>),
    }

    struct ScriptedBackend {
        script: Script,
        calls: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl ScriptedBackend {
        fn new(script: Script) -> Arc<Self> {
            Arc::new(Self {
                script,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn frames<'a>(frames: impl IntoIterator<Item = &'a str>) -> Arc<Self> {
            Self::new(Script::Frames(
                frames.into_iter().map(|f| Ok(f.as_bytes().to_vec())).collect(),
            ))
        }

        fn calls(&self) -> Vec<(String, serde_json::Value)> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(model, body)| (model.clone(), serde_json::from_slice(body).unwrap()))
                .collect()
        }
    }

    #[async_trait]
    impl InferenceBackend for ScriptedBackend {
        async fn invoke_stream(&self, model_id: &str, body: Vec<u8>) -> Result<FrameStream, BackendError> {
            self.calls.lock().unwrap().push((model_id.to_string(), body));

            match &self.script {
                Script::Frames(frames) => Ok(Box::pin(stream::iter(frames.clone()))),
                Script::Refuse(error) => Err(error.clone()),
                Script::Stall(frames) => {
                    let frames = frames.iter().cloned().map(Ok).collect::<Vec<_>>();
                    Ok(Box::pin(stream::iter(frames).chain(stream::pending())))
                }
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<String>>,
        attempts: Mutex<usize>,
        fail_from_attempt: Option<usize>,
    }

    impl RecordingSink {
        fn failing_from(attempt: usize) -> Self {
            Self {
                fail_from_attempt: Some(attempt),
                ..Default::default()
            }
        }

        fn delivered(&self) -> Vec<String> {
            self.delivered.lock().unwrap().clone()
        }

        fn attempts(&self) -> usize {
            *self.attempts.lock().unwrap()
        }
    }

    #[async_trait]
    impl OutputSink for RecordingSink {
        async fn send(&self, _: &ConnectionId, message: &str) -> bool {
            let mut attempts = self.attempts.lock().unwrap();
            *attempts += 1;

            if self.fail_from_attempt.is_some_and(|from| *attempts >= from) {
                return false;
            }

            self.delivered.lock().unwrap().push(message.to_string());
            true
        }
    }

    fn claude_delta(text: &str) -> String {
        serde_json::json!({
            "type": "content_block_delta",
            "index": 0,
            "delta": {"type": "text_delta", "text": text}
        })
        .to_string()
    }

    fn relay(backend: Arc<ScriptedBackend>) -> Relay {
        let config = RelayConfig {
            timeout: Duration::from_secs(5),
            ..Default::default()
        };

        Relay::new(&config, backend)
    }

    fn parameters(json: serde_json::Value) -> GenerationParameters {
        serde_json::from_value(json).unwrap()
    }

    fn connection() -> ConnectionId {
        ConnectionId::new("conn-1")
    }

    #[tokio::test]
    async fn three_chunks_with_empty_tail() {
        let frames = [claude_delta("Hel"), claude_delta("lo"), claude_delta("")];
        let backend = ScriptedBackend::frames(frames.iter().map(String::as_str));
        let sink = RecordingSink::default();
        let relay = relay(backend.clone());

        let request = relay.request("Say hello", parameters(serde_json::json!({"modelId": HAIKU})));
        let outcome = relay.run(&connection(), &sink, request).await;

        assert_eq!(outcome.status, StatusCode::OK);
        assert_eq!(outcome.full_text.as_deref(), Some("Hello"));
        assert_eq!(sink.delivered(), vec!["Hel", "lo", END_OF_STREAM]);
    }

    #[tokio::test]
    async fn haiku_request_payload() {
        let backend = ScriptedBackend::frames([]);
        let sink = RecordingSink::default();
        let relay = relay(backend.clone());

        let request = relay.request("2+2?", parameters(serde_json::json!({"modelId": HAIKU})));
        let outcome = relay.run(&connection(), &sink, request).await;

        assert!(outcome.is_completed());
        assert_eq!(outcome.full_text.as_deref(), Some(""));
        assert_eq!(sink.delivered(), vec![END_OF_STREAM]);

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, HAIKU);

        assert_eq!(
            calls[0].1,
            serde_json::json!({
                "anthropic_version": "bedrock-2023-05-31",
                "max_tokens": 256,
                "messages": [{"role": "user", "content": "2+2?"}],
                "temperature": 0.0
            })
        );
    }

    #[tokio::test]
    async fn default_model_and_parameters() {
        let backend = ScriptedBackend::frames([r#"{"completion":"ok"}"#]);
        let sink = RecordingSink::default();
        let relay = relay(backend.clone());

        let request = relay.request("hi", parameters(serde_json::json!({"maxTokens": 64})));
        assert_eq!(request.model_id, "anthropic.claude-instant-v1");

        let outcome = relay.run(&connection(), &sink, request).await;
        assert_eq!(outcome.full_text.as_deref(), Some("ok"));

        let calls = backend.calls();
        assert_eq!(calls[0].0, "anthropic.claude-instant-v1");
        assert_eq!(
            calls[0].1,
            serde_json::json!({"prompt": "hi", "max_tokens_to_sample": 64, "temperature": 0.0})
        );
    }

    #[tokio::test]
    async fn titan_single_chunk() {
        let backend = ScriptedBackend::frames([r#"{"outputText":"Paris"}"#]);
        let sink = RecordingSink::default();
        let relay = relay(backend);

        let request = relay.request(
            "Capital of France?",
            parameters(serde_json::json!({"modelId": "amazon.titan-text-lite-v1"})),
        );
        let outcome = relay.run(&connection(), &sink, request).await;

        assert_eq!(outcome.full_text.as_deref(), Some("Paris"));
        assert_eq!(sink.delivered(), vec!["Paris", END_OF_STREAM]);
    }

    #[tokio::test]
    async fn model_outside_allow_list() {
        let backend = ScriptedBackend::frames([]);
        let sink = RecordingSink::default();
        let relay = relay(backend.clone());

        let request = relay.request("hi", parameters(serde_json::json!({"modelId": "mistral.unknown-v9"})));
        let outcome = relay.run(&connection(), &sink, request).await;

        assert_eq!(outcome.status, StatusCode::BAD_REQUEST);
        assert_eq!(outcome.full_text, None);
        assert_eq!(
            sink.delivered(),
            vec!["Model does not support streaming: mistral.unknown-v9"]
        );
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn allowed_model_with_unsupported_provider() {
        let backend = ScriptedBackend::frames([]);
        let sink = RecordingSink::default();
        let relay = relay(backend.clone()).with_catalog(ProviderCatalog::new(["mistral.unknown-v9"]));

        let request = relay.request("hi", parameters(serde_json::json!({"modelId": "mistral.unknown-v9"})));
        let outcome = relay.run(&connection(), &sink, request).await;

        assert_eq!(outcome.status, StatusCode::BAD_REQUEST);
        assert_eq!(sink.delivered(), vec!["Unsupported provider: mistral"]);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn malformed_middle_chunk_is_skipped() {
        let frames = [claude_delta("A"), "{not json".to_string(), claude_delta("B")];
        let backend = ScriptedBackend::frames(frames.iter().map(String::as_str));
        let sink = RecordingSink::default();
        let relay = relay(backend);

        let request = relay.request("hi", parameters(serde_json::json!({"modelId": HAIKU})));
        let outcome = relay.run(&connection(), &sink, request).await;

        assert_eq!(outcome.status, StatusCode::OK);
        assert_eq!(outcome.full_text.as_deref(), Some("AB"));
        assert_eq!(sink.delivered(), vec!["A", "B", END_OF_STREAM]);
    }

    #[tokio::test]
    async fn lost_connection_keeps_accumulating() {
        let frames = [claude_delta("one "), claude_delta("two "), claude_delta("three")];
        let backend = ScriptedBackend::frames(frames.iter().map(String::as_str));
        let sink = RecordingSink::failing_from(2);
        let relay = relay(backend);

        let request = relay.request("count", parameters(serde_json::json!({"modelId": HAIKU})));
        let outcome = relay.run(&connection(), &sink, request).await;

        assert_eq!(outcome.status, StatusCode::OK);
        assert_eq!(outcome.full_text.as_deref(), Some("one two three"));
        assert_eq!(sink.delivered(), vec!["one "]);
        // no sends after the failure, the end marker included
        assert_eq!(sink.attempts(), 2);
    }

    #[tokio::test]
    async fn backend_refuses_the_call() {
        let backend = ScriptedBackend::new(Script::Refuse(BackendError::AccessDenied(
            "not authorized to invoke model".to_string(),
        )));
        let sink = RecordingSink::default();
        let relay = relay(backend);

        let request = relay.request("hi", parameters(serde_json::json!({"modelId": HAIKU})));
        let outcome = relay.run(&connection(), &sink, request).await;

        assert_eq!(outcome.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(outcome.full_text, None);
        assert_eq!(
            sink.delivered(),
            vec!["Error processing chat: Access denied: not authorized to invoke model"]
        );
    }

    #[tokio::test]
    async fn stream_breaks_midway() {
        let backend = ScriptedBackend::new(Script::Frames(vec![
            Ok(claude_delta("partial").into_bytes()),
            Err(BackendError::Connection("connection reset".to_string())),
        ]));
        let sink = RecordingSink::default();
        let relay = relay(backend);

        let request = relay.request("hi", parameters(serde_json::json!({"modelId": HAIKU})));
        let outcome = relay.run(&connection(), &sink, request).await;

        assert_eq!(outcome.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(outcome.full_text, None);
        assert_eq!(
            sink.delivered(),
            vec!["partial", "Error processing chat: Connection error: connection reset"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expires() {
        let backend = ScriptedBackend::new(Script::Stall(vec![claude_delta("slow").into_bytes()]));
        let sink = RecordingSink::default();
        let relay = relay(backend);

        let request = relay.request("hi", parameters(serde_json::json!({"modelId": HAIKU})));
        let outcome = relay.run(&connection(), &sink, request).await;

        assert_eq!(outcome.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            sink.delivered(),
            vec!["slow", "Error processing chat: generation timed out after 5s"]
        );
    }

    #[tokio::test]
    async fn rejection_on_a_lost_connection_is_silent() {
        let backend = ScriptedBackend::frames([]);
        let sink = RecordingSink::failing_from(1);
        let relay = relay(backend);

        let request = relay.request("hi", parameters(serde_json::json!({"modelId": "mistral.unknown-v9"})));
        let outcome = relay.run(&connection(), &sink, request).await;

        assert_eq!(outcome.status, StatusCode::BAD_REQUEST);
        assert!(sink.delivered().is_empty());
        assert_eq!(sink.attempts(), 1);
    }
}
