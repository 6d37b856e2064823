//! WebSocket client for talking to a running relay.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::{net::TcpStream, time::timeout};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, Message, http::StatusCode},
};

const RECEIVE_TIMEOUT: Duration = Duration::from_secs(5);

/// One open relay connection.
pub struct SocketClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl SocketClient {
    /// Connect to `url`, panicking if the server does not accept the upgrade.
    pub async fn connect(url: &str) -> Self {
        let (stream, _) = connect_async(url).await.unwrap();
        Self { stream }
    }

    /// Connect to `url` expecting the upgrade to be refused; returns the HTTP status.
    pub async fn connect_refused(url: &str) -> StatusCode {
        let error = connect_async(url).await.err().expect("upgrade unexpectedly succeeded");

        match error {
            tungstenite::Error::Http(response) => response.status(),
            e => unreachable!("unexpected connection error: {e}"),
        }
    }

    /// Send a raw text frame.
    pub async fn send_text(&mut self, text: impl Into<String>) {
        self.stream.send(Message::text(text.into())).await.unwrap();
    }

    /// Send a JSON body.
    pub async fn send_json(&mut self, body: serde_json::Value) {
        self.send_text(body.to_string()).await;
    }

    /// The next text frame, panicking after five seconds of silence.
    pub async fn receive(&mut self) -> String {
        self.try_receive(RECEIVE_TIMEOUT)
            .await
            .expect("no message within the receive timeout")
    }

    /// The next text frame if one arrives within `wait`.
    pub async fn try_receive(&mut self, wait: Duration) -> Option<String> {
        loop {
            let message = timeout(wait, self.stream.next()).await.ok()??.unwrap();

            match message {
                Message::Text(text) => return Some(text.as_str().to_owned()),
                Message::Close(_) => return None,
                _ => continue,
            }
        }
    }

    /// Every frame up to and including the end-of-response marker.
    pub async fn receive_response(&mut self) -> Vec<String> {
        let mut messages = Vec::new();

        loop {
            let message = self.receive().await;
            let done = message == llm::END_OF_STREAM;

            messages.push(message);

            if done {
                return messages;
            }
        }
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
