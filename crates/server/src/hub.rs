//! Live WebSocket connections, addressable by connection id.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use llm::{ConnectionId, OutputSink};
use tokio::sync::mpsc;

/// Outbound queues of the connections served by this process.
///
/// Each attached connection has an unbounded queue drained by its socket writer task, so sends
/// never wait on the network.
#[derive(Clone, Default)]
pub struct ConnectionHub {
    connections: Arc<DashMap<ConnectionId, mpsc::UnboundedSender<String>>>,
}

impl ConnectionHub {
    /// Register a connection and return the receiving end of its outbound queue.
    pub fn attach(&self, connection: ConnectionId) -> mpsc::UnboundedReceiver<String> {
        let (sender, receiver) = mpsc::unbounded_channel();

        if self.connections.insert(connection.clone(), sender).is_some() {
            log::warn!("Connection {connection} was attached twice, replacing its queue");
        }

        log::debug!("Attached {connection}, {} connections open", self.len());

        receiver
    }

    /// Forget a connection. Its queue closes once in-flight sends finish.
    pub fn detach(&self, connection: &ConnectionId) {
        self.connections.remove(connection);

        if self.is_empty() {
            log::debug!("Detached {connection}, no connections open");
        }
    }

    /// Number of attached connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[async_trait]
impl OutputSink for ConnectionHub {
    async fn send(&self, connection: &ConnectionId, message: &str) -> bool {
        let Some(sender) = self.connections.get(connection).map(|entry| entry.value().clone()) else {
            log::warn!("Failed to send to connection {connection}: not connected");
            return false;
        };

        match sender.send(message.to_string()) {
            Ok(()) => true,
            Err(_) => {
                log::warn!("Failed to send to connection {connection}: socket writer has stopped");
                false
            }
        }
    }
}
