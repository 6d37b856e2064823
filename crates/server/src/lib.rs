//! Relay server library.
//!
//! Provides a reusable server function to serve the relay either for the binary, or for the integration tests.

mod dispatch;
mod health;
mod history;
mod hub;
mod registry;
mod websocket;

use std::{net::SocketAddr, sync::Arc};

use anyhow::anyhow;
use axum::{Router, routing::get};
use config::Config;
use llm::{BedrockBackend, InferenceBackend, Relay};
use tokio::net::TcpListener;

pub use dispatch::{Dispatcher, RouteEvent, RouteKey};
pub use history::{HistoryRecorder, LogHistory};
pub use hub::ConnectionHub;
pub use registry::{ConnectionRecord, ConnectionRegistry, MemoryRegistry, RedisRegistry, RegistryError};

/// Configuration for serving the relay.
pub struct ServeConfig {
    /// The socket address (IP and port) the server will bind to
    pub listen_address: SocketAddr,
    /// The deserialized relay TOML configuration.
    pub config: Config,
    /// The model backend. AWS Bedrock, configured from `[bedrock]`, when not given.
    pub backend: Option<Arc<dyn InferenceBackend>>,
}

/// Starts and runs the relay server with the provided configuration.
pub async fn serve(
    ServeConfig {
        listen_address,
        config,
        backend,
    }: ServeConfig,
) -> anyhow::Result<()> {
    config.validate()?;

    let backend = backend.unwrap_or_else(|| Arc::new(BedrockBackend::new(config.bedrock.clone())));
    let registry = registry::from_config(&config.registry)?;
    let relay = Relay::new(&config.relay, backend);

    let dispatcher = Arc::new(Dispatcher::new(
        relay,
        ConnectionHub::default(),
        registry,
        Arc::new(LogHistory),
    ));

    let mut app = Router::new()
        .route(&config.server.path, get(websocket::upgrade))
        .with_state(dispatcher);

    if config.server.health.enabled {
        app = app.route(&config.server.health.path, get(health::health));
    }

    let listener = TcpListener::bind(listen_address)
        .await
        .map_err(|e| anyhow!("Failed to bind to {listen_address}: {e}"))?;

    log::info!("WebSocket endpoint available at: ws://{listen_address}{}", config.server.path);

    if config.server.health.enabled {
        log::info!(
            "Health check endpoint exposed at http://{listen_address}{}",
            config.server.health.path
        );
    }

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow!("Failed to start HTTP server: {e}"))?;

    Ok(())
}
