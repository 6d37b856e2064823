use async_trait::async_trait;
use dashmap::DashMap;
use llm::ConnectionId;

use super::{ConnectionRecord, ConnectionRegistry, RegistryError};

/// In-process registry, lost on restart.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    records: DashMap<ConnectionId, String>,
}

impl MemoryRegistry {
    /// The user name recorded for a connection.
    pub fn user_name(&self, connection: &ConnectionId) -> Option<String> {
        self.records.get(connection).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ConnectionRegistry for MemoryRegistry {
    async fn put(&self, record: &ConnectionRecord) -> Result<(), RegistryError> {
        self.records
            .insert(record.connection_id.clone(), record.user_name.clone());

        log::debug!("{} connections registered", self.len());

        Ok(())
    }

    async fn delete(&self, connection: &ConnectionId) -> Result<(), RegistryError> {
        self.records.remove(connection);

        if self.is_empty() {
            log::debug!("No connections registered");
        }

        Ok(())
    }
}
