use std::fmt;

use async_trait::async_trait;

/// Opaque identifier of one client connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Delivers text messages to a connection.
///
/// Delivery is best-effort: failures are logged by the implementation and reported as `false`,
/// never raised.
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Deliver one text message. Returns whether the transport accepted it.
    async fn send(&self, connection: &ConnectionId, message: &str) -> bool;
}
