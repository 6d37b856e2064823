//! An inference backend that replays scripted frames instead of calling AWS Bedrock.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;
use llm::{BackendError, FrameStream, InferenceBackend};

enum Reply {
    Frames(Vec<Result<Vec<u8>, BackendError>>),
    Refuse(BackendError),
    Stall,
}

/// Records every invocation and answers each one with the same scripted reply.
pub struct ScriptedBackend {
    reply: Reply,
    calls: Mutex<Vec<Invocation>>,
}

/// One recorded backend call.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub model_id: String,
    pub body: serde_json::Value,
}

impl ScriptedBackend {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Streams the given JSON frames, then ends.
    pub fn frames<'a>(frames: impl IntoIterator<Item = &'a str>) -> Arc<Self> {
        Self::new(Reply::Frames(
            frames.into_iter().map(|frame| Ok(frame.as_bytes().to_vec())).collect(),
        ))
    }

    /// Streams the given JSON frames, then fails with `error`.
    pub fn frames_then_error<'a>(frames: impl IntoIterator<Item = &'a str>, error: BackendError) -> Arc<Self> {
        let mut frames: Vec<_> = frames.into_iter().map(|frame| Ok(frame.as_bytes().to_vec())).collect();
        frames.push(Err(error));

        Self::new(Reply::Frames(frames))
    }

    /// Refuses to open a stream.
    pub fn refusing(error: BackendError) -> Arc<Self> {
        Self::new(Reply::Refuse(error))
    }

    /// Opens a stream that never yields.
    pub fn stalled() -> Arc<Self> {
        Self::new(Reply::Stall)
    }

    /// The Anthropic messages stream of a response split into the given deltas.
    pub fn anthropic<'a>(deltas: impl IntoIterator<Item = &'a str>) -> Arc<Self> {
        let mut frames = vec![r#"{"type":"message_start","message":{"role":"assistant"}}"#.to_string()];

        for delta in deltas {
            let frame = serde_json::json!({
                "type": "content_block_delta",
                "index": 0,
                "delta": { "type": "text_delta", "text": delta }
            });

            frames.push(frame.to_string());
        }

        frames.push(r#"{"type":"message_stop"}"#.to_string());

        Self::new(Reply::Frames(
            frames.into_iter().map(|frame| Ok(frame.into_bytes())).collect(),
        ))
    }

    /// All invocations seen so far.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    async fn invoke_stream(&self, model_id: &str, body: Vec<u8>) -> Result<FrameStream, BackendError> {
        self.calls.lock().unwrap().push(Invocation {
            model_id: model_id.to_string(),
            body: serde_json::from_slice(&body).unwrap(),
        });

        match &self.reply {
            Reply::Frames(frames) => Ok(Box::pin(stream::iter(frames.clone()))),
            Reply::Refuse(error) => Err(error.clone()),
            Reply::Stall => Ok(Box::pin(stream::pending())),
        }
    }
}

