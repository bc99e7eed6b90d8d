//! WebSocket handling for space clients.
//!
//! One task reads the socket and feeds the coordinator; a second task drains
//! the connection's bounded outbox into the socket.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

pub mod error_sanitizer;

use metaverse_domain::ConnectionId;
use metaverse_shared::{ClientMessage, ServerMessage};

use crate::use_cases::coordinator::{Connection, Coordinator, CoordinatorError};
use error_sanitizer::{error_reply, messages};

/// How long the writer may keep flushing after the reader is done.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// State for WebSocket handlers.
pub struct WsState {
    pub coordinator: Arc<Coordinator>,
    /// Capacity of each connection's outbound queue.
    pub outbound_buffer: usize,
}

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<WsState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<WsState>) {
    let connection_id = ConnectionId::new();
    tracing::info!(connection_id = %connection_id, "New WebSocket connection");

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(state.outbound_buffer);
    let mut connection = Connection::new(connection_id, tx);

    // Ends once every sender is dropped (connection and registry entry).
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, event = msg.kind(), "Failed to serialize server message");
                }
            }
        }
        let _ = ws_sender.close().await;
    });

    while let Some(result) = ws_receiver.next().await {
        let outcome = match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                Ok(msg) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        message = msg.kind(),
                        "Received client message"
                    );
                    let kind = msg.kind();
                    state
                        .coordinator
                        .handle(&mut connection, msg)
                        .await
                        .map_err(|e| (e, kind))
                }
                Err(e) => {
                    tracing::warn!(
                        connection_id = %connection_id,
                        error = %e,
                        "Failed to parse client message"
                    );
                    Err((
                        CoordinatorError::protocol(format!("{}: {}", messages::INVALID_MESSAGE, e)),
                        "parsing",
                    ))
                }
            },
            Ok(Message::Binary(_)) => Err((
                CoordinatorError::protocol(messages::BINARY_UNSUPPORTED),
                "parsing",
            )),
            Ok(Message::Close(_)) => {
                tracing::info!(connection_id = %connection_id, "Client closed connection");
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
        };

        if let Err((err, kind)) = outcome {
            connection.reply(error_reply(&err, &format!("handling '{}'", kind)));
            if err.is_fatal() {
                tracing::warn!(connection_id = %connection_id, error = %err, "Closing connection after internal error");
                break;
            }
        }
        if connection.is_closed() {
            break;
        }
    }

    state.coordinator.disconnect(&mut connection).await;
    drop(connection);

    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut send_task)
        .await
        .is_err()
    {
        send_task.abort();
    }
    tracing::info!(connection_id = %connection_id, "WebSocket connection terminated");
}

#[cfg(test)]
mod test_support;
