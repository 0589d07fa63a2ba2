use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt, TryFutureExt};
use log::{error, info, warn};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use fleetcam_protocol::SignalMessage;

use crate::registry::{ClientId, Registry};

const GREETING: &str = "connected to the fleetcam signaling server";

/// Runs one peer's connection from handshake to close.
///
/// Registers the peer, greets it with a `connection_success` frame and then
/// forwards every well-formed frame it sends to all other registered peers.
/// Errors on this socket only ever remove this peer from the registry.
pub async fn client_connected(ws: WebSocket, registry: Registry) {
    let (mut ws_tx, mut ws_rx) = ws.split();

    let (tx, rx) = mpsc::unbounded_channel();
    let mut rx = UnboundedReceiverStream::new(rx);

    tokio::task::spawn(async move {
        while let Some(message) = rx.next().await {
            ws_tx
                .send(message)
                .unwrap_or_else(|e| error!("websocket send error: {}", e))
                .await;
        }
    });

    let client_id = registry.register(tx.clone()).await;
    info!(
        "new client connected: {} ({} now registered)",
        client_id,
        registry.len().await
    );

    send_greeting(client_id, &tx);

    while let Some(result) = ws_rx.next().await {
        let message = match result {
            Ok(message) => message,
            Err(e) => {
                error!("websocket error (client {}): {}", client_id, e);
                break;
            }
        };

        client_message(client_id, &message, &registry).await;
    }

    info!("client disconnected: {}", client_id);
    registry.remove(client_id).await;
}

fn send_greeting(client_id: ClientId, tx: &mpsc::UnboundedSender<Message>) {
    let greeting = SignalMessage::ConnectionSuccess {
        message: GREETING.to_owned(),
    };
    match serde_json::to_string(&greeting) {
        Ok(greeting) => {
            if tx.send(Message::Text(greeting)).is_err() {
                warn!("client {} went away before the greeting was sent", client_id);
            }
        }
        Err(e) => error!("failed to serialize greeting: {}", e),
    }
}

/// Handles one inbound frame: peek at the tag for logging, then fan the
/// original text out verbatim to everyone but the sender. Frames that are
/// not valid JSON are logged and dropped; the connection stays open.
async fn client_message(client_id: ClientId, message: &Message, registry: &Registry) {
    let text = match message {
        Message::Text(text) => text,
        // control and binary frames are not part of the signaling contract
        _ => return,
    };

    match serde_json::from_str::<Value>(text) {
        Ok(value) => {
            let tag = value
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            info!("{} received from client {}", tag, client_id);
            registry
                .broadcast_except(client_id, Message::Text(text.clone()))
                .await;
        }
        Err(e) => {
            error!("dropping malformed message from client {}: {}", client_id, e);
        }
    }
}
