use async_trait::async_trait;
use llm::ConnectionId;

/// Receives every completed exchange.
#[async_trait]
pub trait HistoryRecorder: Send + Sync {
    async fn record(&self, connection: &ConnectionId, prompt: &str, response: &str);
}

/// Writes exchanges to the log instead of storing them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogHistory;

#[async_trait]
impl HistoryRecorder for LogHistory {
    async fn record(&self, connection: &ConnectionId, prompt: &str, response: &str) {
        log::info!(
            "Complete response generated for {connection}: {} characters",
            response.chars().count()
        );
        log::debug!("Exchange on {connection}: prompt {prompt:?}, response {response:?}");
    }
}
