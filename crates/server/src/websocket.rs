//! The WebSocket endpoint.
//!
//! A connection is registered before the upgrade completes, so a registry failure is answered
//! with a plain `503` instead of a socket. After the upgrade a writer task drains the connection's
//! hub queue into the socket while the reader spawns one dispatch per text frame, so several
//! prompts on one connection run concurrently.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use http::StatusCode;
use llm::ConnectionId;
use uuid::Uuid;

use crate::dispatch::{Dispatcher, RouteEvent};

pub(crate) async fn upgrade(
    ws: WebSocketUpgrade,
    Query(query): Query<HashMap<String, String>>,
    State(dispatcher): State<Arc<Dispatcher>>,
) -> Response {
    let connection_id = ConnectionId::new(Uuid::new_v4().to_string());

    let status = dispatcher
        .dispatch(RouteEvent::connect(connection_id.clone(), query))
        .await;

    if status != StatusCode::OK {
        return status.into_response();
    }

    let failed = (dispatcher.clone(), connection_id.clone());

    ws.on_failed_upgrade(move |e| {
        let (dispatcher, connection_id) = failed;
        log::warn!("WebSocket upgrade for {connection_id} failed: {e}");

        tokio::spawn(async move {
            dispatcher.dispatch(RouteEvent::disconnect(connection_id)).await;
        });
    })
    .on_upgrade(move |socket| serve_socket(socket, connection_id, dispatcher))
}

async fn serve_socket(socket: WebSocket, connection_id: ConnectionId, dispatcher: Arc<Dispatcher>) {
    let (mut write, mut read) = socket.split();
    let mut outbound = dispatcher.hub().attach(connection_id.clone());

    let writer_id = connection_id.clone();
    let writer = tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if let Err(e) = write.send(Message::Text(text.into())).await {
                log::debug!("Stopped writing to {writer_id}: {e}");
                return;
            }
        }

        if let Err(e) = write.close().await {
            log::debug!("Failed to close socket of {writer_id}: {e}");
        }
    });

    while let Some(message) = read.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let event = RouteEvent::message(connection_id.clone(), text.as_str().to_owned());
                let dispatcher = dispatcher.clone();

                tokio::spawn(async move {
                    let connection_id = event.connection_id.clone();
                    let status = dispatcher.dispatch(event).await;

                    log::debug!("Message on {connection_id} finished with status {status}");
                });
            }
            Ok(Message::Close(_)) => break,
            // ping/pong are answered by the protocol layer
            Ok(Message::Binary(_) | Message::Ping(_) | Message::Pong(_)) => {}
            Err(e) => {
                log::debug!("Read error on {connection_id}: {e}");
                break;
            }
        }
    }

    // in-flight relays keep running and find the connection gone
    dispatcher.hub().detach(&connection_id);
    dispatcher.dispatch(RouteEvent::disconnect(connection_id)).await;

    if let Err(e) = writer.await {
        log::debug!("Socket writer task ended abnormally: {e}");
    }
}
