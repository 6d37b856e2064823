//! Routing of connection lifecycle events and inbound messages.
//!
//! Every event resolves to a status code, mirroring how a WebSocket gateway reports route results.
//! Text frames pick their route from an optional `action` field; frames without one take the
//! default route, which relays the prompt.

use std::{collections::HashMap, sync::Arc};

use http::StatusCode;
use llm::{ConnectionId, GenerationParameters, Relay};
use serde::Deserialize;

use crate::{
    history::HistoryRecorder,
    hub::ConnectionHub,
    registry::{ConnectionRecord, ConnectionRegistry},
};

/// Actions that relay a prompt.
const RELAY_ACTIONS: [&str; 3] = ["sendMessage", "invokeModel", "chatMessage"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteKey {
    /// `$connect`
    Connect,
    /// `$disconnect`
    Disconnect,
    /// `$default` or one of the relay actions.
    SendMessage,
    /// Any other action.
    Unknown(String),
}

impl RouteKey {
    /// Pick the route for a text frame from its `action` field.
    pub fn for_message(body: &str) -> Self {
        #[derive(Deserialize)]
        struct Envelope {
            #[serde(default)]
            action: Option<String>,
        }

        // frames that are not JSON objects fail later, when the message is parsed
        let Ok(Envelope { action: Some(action) }) = sonic_rs::from_str::<Envelope>(body) else {
            return Self::SendMessage;
        };

        if action == "$default" || RELAY_ACTIONS.contains(&action.as_str()) {
            Self::SendMessage
        } else {
            Self::Unknown(action)
        }
    }
}

/// One event on one connection.
#[derive(Debug, Clone)]
pub struct RouteEvent {
    pub route_key: RouteKey,
    pub connection_id: ConnectionId,
    pub body: Option<String>,
    pub query: HashMap<String, String>,
}

impl RouteEvent {
    pub fn connect(connection_id: ConnectionId, query: HashMap<String, String>) -> Self {
        Self {
            route_key: RouteKey::Connect,
            connection_id,
            body: None,
            query,
        }
    }

    pub fn disconnect(connection_id: ConnectionId) -> Self {
        Self {
            route_key: RouteKey::Disconnect,
            connection_id,
            body: None,
            query: HashMap::new(),
        }
    }

    pub fn message(connection_id: ConnectionId, body: String) -> Self {
        Self {
            route_key: RouteKey::for_message(&body),
            connection_id,
            body: Some(body),
            query: HashMap::new(),
        }
    }
}

/// Body of a relay message.
#[derive(Debug, Deserialize)]
struct InboundMessage {
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    parameters: GenerationParameters,
}

/// Executes route events against the relay, the hub and the registry.
pub struct Dispatcher {
    relay: Relay,
    hub: ConnectionHub,
    registry: Arc<dyn ConnectionRegistry>,
    history: Arc<dyn HistoryRecorder>,
}

impl Dispatcher {
    pub fn new(
        relay: Relay,
        hub: ConnectionHub,
        registry: Arc<dyn ConnectionRegistry>,
        history: Arc<dyn HistoryRecorder>,
    ) -> Self {
        Self {
            relay,
            hub,
            registry,
            history,
        }
    }

    /// The hub relay output is delivered through.
    pub fn hub(&self) -> &ConnectionHub {
        &self.hub
    }

    pub async fn dispatch(&self, event: RouteEvent) -> StatusCode {
        let RouteEvent {
            route_key,
            connection_id,
            body,
            query,
        } = event;

        match route_key {
            RouteKey::Connect => self.connect(connection_id, &query).await,
            RouteKey::Disconnect => self.disconnect(&connection_id).await,
            RouteKey::SendMessage => self.send_message(&connection_id, body.as_deref()).await,
            RouteKey::Unknown(action) => {
                log::warn!("No route for action '{action}' on connection {connection_id}");
                StatusCode::BAD_REQUEST
            }
        }
    }

    async fn connect(&self, connection_id: ConnectionId, query: &HashMap<String, String>) -> StatusCode {
        let record = ConnectionRecord::new(connection_id, query.get("name").map(String::as_str));

        log::info!(
            "Connection {}, user {}",
            record.connection_id,
            record.user_name
        );

        match self.registry.put(&record).await {
            Ok(()) => StatusCode::OK,
            Err(e) => {
                log::error!("Couldn't add connection {} for user {}: {e}", record.connection_id, record.user_name);
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }

    async fn disconnect(&self, connection_id: &ConnectionId) -> StatusCode {
        match self.registry.delete(connection_id).await {
            Ok(()) => {
                log::info!("Disconnected connection {connection_id}");
                StatusCode::OK
            }
            Err(e) => {
                log::error!("Couldn't disconnect connection {connection_id}: {e}");
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }

    async fn send_message(&self, connection_id: &ConnectionId, body: Option<&str>) -> StatusCode {
        let message: InboundMessage = match sonic_rs::from_str(body.unwrap_or("{}")) {
            Ok(message) => message,
            Err(e) => {
                log::error!("Invalid JSON in message body from {connection_id}: {e}");
                return StatusCode::BAD_REQUEST;
            }
        };

        if message.prompt.is_empty() {
            log::error!("Missing prompt in message body from {connection_id}");
            return StatusCode::BAD_REQUEST;
        }

        let request = self.relay.request(message.prompt, message.parameters);
        log::info!("Processing chat with model {} for {connection_id}", request.model_id);

        let prompt = request.prompt.clone();
        let outcome = self.relay.run(connection_id, &self.hub, request).await;

        if !outcome.is_completed() {
            log::info!("Chat for {connection_id} ended with status {}", outcome.status);
        }

        if let Some(response) = outcome.full_text.as_deref().filter(|text| !text.is_empty()) {
            self.history.record(connection_id, &prompt, response).await;
        }

        outcome.status
    }
}
