//! Bookkeeping of open connections and who opened them.

mod memory;
mod redis;

use std::sync::Arc;

use async_trait::async_trait;
use config::RegistryConfig;
use llm::ConnectionId;
use thiserror::Error;

pub use memory::MemoryRegistry;
pub use redis::RedisRegistry;

/// User name recorded when the client does not give one.
pub const GUEST_USER: &str = "guest";

/// What is stored per open connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
    pub connection_id: ConnectionId,
    pub user_name: String,
}

impl ConnectionRecord {
    pub fn new(connection_id: ConnectionId, user_name: Option<&str>) -> Self {
        Self {
            connection_id,
            user_name: user_name.unwrap_or(GUEST_USER).to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("connection registry unavailable: {0}")]
    Unavailable(String),

    #[error("connection registry command failed: {0}")]
    Command(String),
}

impl From<::redis::RedisError> for RegistryError {
    fn from(error: ::redis::RedisError) -> Self {
        Self::Command(error.to_string())
    }
}

/// Storage of connection records.
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Store the record of a newly opened connection.
    async fn put(&self, record: &ConnectionRecord) -> Result<(), RegistryError>;

    /// Remove the record of a closed connection. Removing an unknown connection is not an error.
    async fn delete(&self, connection: &ConnectionId) -> Result<(), RegistryError>;
}

/// Build the registry selected by the configuration.
pub fn from_config(config: &RegistryConfig) -> anyhow::Result<Arc<dyn ConnectionRegistry>> {
    match config {
        RegistryConfig::Memory => {
            log::debug!("Keeping connection records in memory");
            Ok(Arc::new(MemoryRegistry::default()))
        }
        RegistryConfig::Redis(redis_config) => {
            log::debug!("Keeping connection records in Redis");
            let registry = RedisRegistry::new(redis_config)
                .map_err(|e| anyhow::anyhow!("Failed to initialize Redis connection registry: {e}"))?;

            Ok(Arc::new(registry))
        }
    }
}
