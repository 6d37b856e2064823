//! Redis-backed connection registry, for deployments with several relay processes.
//!
//! Each connection is a hash at `<key_prefix><connection id>` with `connectionId` and `userName`
//! fields. Records expire after the configured TTL in case a disconnect is never observed.

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use config::RedisConfig;
use deadpool::managed::{self, Metrics};
use llm::ConnectionId;
use redis::{Client, RedisError, RedisResult, aio::MultiplexedConnection};

use super::{ConnectionRecord, ConnectionRegistry, RegistryError};

type Pool = managed::Pool<Manager>;

pub struct RedisRegistry {
    pool: Pool,
    key_prefix: String,
    ttl: Option<Duration>,
}

impl RedisRegistry {
    /// Create the registry. Connections are opened lazily on first use.
    pub fn new(config: &RedisConfig) -> RedisResult<Self> {
        Ok(Self {
            pool: create_pool(config)?,
            key_prefix: config.key_prefix.clone(),
            ttl: config.ttl,
        })
    }

    fn key(&self, connection: &ConnectionId) -> String {
        format!("{}{connection}", self.key_prefix)
    }

    async fn connection(&self) -> Result<managed::Object<Manager>, RegistryError> {
        self.pool.get().await.map_err(|e| {
            log::error!("Failed to get Redis connection from pool: {e}");
            RegistryError::Unavailable(e.to_string())
        })
    }
}

#[async_trait]
impl ConnectionRegistry for RedisRegistry {
    async fn put(&self, record: &ConnectionRecord) -> Result<(), RegistryError> {
        let mut conn = self.connection().await?;
        let key = self.key(&record.connection_id);

        let mut pipe = redis::pipe();
        pipe.atomic()
            .hset_multiple(
                &key,
                &[
                    ("connectionId", record.connection_id.as_str()),
                    ("userName", record.user_name.as_str()),
                ],
            )
            .ignore();

        if let Some(ttl) = self.ttl {
            pipe.expire(&key, i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX))
                .ignore();
        }

        pipe.query_async::<()>(&mut *conn).await?;

        Ok(())
    }

    async fn delete(&self, connection: &ConnectionId) -> Result<(), RegistryError> {
        let mut conn = self.connection().await?;

        redis::cmd("DEL")
            .arg(self.key(connection))
            .query_async::<()>(&mut *conn)
            .await?;

        Ok(())
    }
}

#[derive(Debug)]
struct Manager {
    client: Client,
    ping_number: AtomicUsize,
}

impl managed::Manager for Manager {
    type Type = MultiplexedConnection;
    type Error = RedisError;

    async fn create(&self) -> Result<MultiplexedConnection, Self::Error> {
        self.client.get_multiplexed_async_connection().await
    }

    async fn recycle(&self, conn: &mut MultiplexedConnection, _: &Metrics) -> managed::RecycleResult<Self::Error> {
        let ping_number = self.ping_number.fetch_add(1, Ordering::Relaxed).to_string();

        let (n,) = redis::Pipeline::with_capacity(2)
            .cmd("UNWATCH")
            .ignore()
            .cmd("PING")
            .arg(&ping_number)
            .query_async::<(String,)>(conn)
            .await?;

        if n == ping_number {
            Ok(())
        } else {
            Err(managed::RecycleError::message("Invalid PING response"))
        }
    }
}

fn create_pool(config: &RedisConfig) -> RedisResult<Pool> {
    let manager = Manager {
        client: Client::open(config.url.as_str())?,
        ping_number: AtomicUsize::new(0),
    };

    let mut pool_config = managed::PoolConfig::default();

    if let Some(max_size) = config.pool.max_size {
        pool_config.max_size = max_size;
    }

    pool_config.timeouts.create = config.pool.timeout_create;
    pool_config.timeouts.wait = config.pool.timeout_wait;
    pool_config.timeouts.recycle = config.pool.timeout_recycle;

    Pool::builder(manager)
        .config(pool_config)
        .runtime(deadpool::Runtime::Tokio1)
        .build()
        .map_err(|e| RedisError::from((redis::ErrorKind::IoError, "Failed to create pool", e.to_string())))
}
