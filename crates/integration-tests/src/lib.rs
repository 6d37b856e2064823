mod backend;
mod socket;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use config::Config;
use server::ServeConfig;
use tokio::{net::TcpListener, time::timeout};

pub use backend::{Invocation, ScriptedBackend};
pub use socket::SocketClient;

/// Test client for making HTTP requests to the test server
pub struct TestClient {
    base_url: String,
    client: reqwest::Client,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Send a GET request to the given path
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap()
    }
}

/// Builder for a relay server backed by a scripted model backend.
pub struct TestServerBuilder {
    backend: Arc<ScriptedBackend>,
}

impl TestServerBuilder {
    /// Use `backend` instead of the default, which answers every prompt with "Hello!".
    pub fn backend(mut self, backend: Arc<ScriptedBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Start the server with the given TOML configuration.
    pub async fn build(self, config_toml: &str) -> TestServer {
        let config: Config = toml::from_str(config_toml).unwrap();
        let socket_path = config.server.path.to_string();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let serve_config = ServeConfig {
            listen_address: address,
            config,
            backend: Some(self.backend.clone()),
        };

        let (tx, mut rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            // Drop the listener so the server can bind to the address
            drop(listener);

            let _ = tx.send(server::serve(serve_config).await);
        });

        tokio::time::sleep(Duration::from_millis(100)).await;

        if let Ok(Err(e)) = rx.try_recv() {
            eprintln!("Server failed to start: {e}");
            std::process::exit(1);
        }

        let client = TestClient::new(format!("http://{address}"));

        let mut retries = 10;
        while retries > 0 {
            if timeout(Duration::from_millis(100), client.get("/")).await.is_ok() {
                break;
            }

            retries -= 1;
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestServer {
            client,
            address,
            socket_path,
            backend: self.backend,
            _handle: handle,
        }
    }
}

/// Test server that manages the lifecycle of a relay instance
pub struct TestServer {
    pub client: TestClient,
    pub address: SocketAddr,
    socket_path: String,
    backend: Arc<ScriptedBackend>,
    _handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub fn builder() -> TestServerBuilder {
        TestServerBuilder {
            backend: ScriptedBackend::anthropic(["Hello", "!"]),
        }
    }

    /// Start a server with the default backend.
    pub async fn start(config_toml: &str) -> Self {
        Self::builder().build(config_toml).await
    }

    /// The WebSocket URL of the relay endpoint, with an optional query string.
    pub fn socket_url(&self, query: Option<&str>) -> String {
        match query {
            Some(query) => format!("ws://{}{}?{query}", self.address, self.socket_path),
            None => format!("ws://{}{}", self.address, self.socket_path),
        }
    }

    /// Open a relay connection.
    pub async fn connect(&self) -> SocketClient {
        SocketClient::connect(&self.socket_url(None)).await
    }

    /// Invocations the backend has received.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.backend.calls()
    }
}
