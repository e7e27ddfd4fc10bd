use std::sync::Arc;
use tokio::sync::mpsc;
use warp::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};

use crate::relay::{RelayServer, SignalingHandler};

/// Drives one WebSocket connection for its lifetime. Liveness is
/// delegated to warp: it answers pings and surfaces a dead socket as a
/// stream error or end-of-stream, either of which ends the receive loop
/// and triggers cleanup. No separate heartbeat timer is kept.
pub async fn handle_relay_websocket(websocket: WebSocket, relay_server: Arc<RelayServer>) {
    tracing::info!("New WebSocket connection established");

    let (mut ws_sender, mut ws_receiver) = websocket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    // One handler per connection; it owns the generated peer identity
    let mut signaling_handler = SignalingHandler::new(relay_server, tx);
    let peer_id = signaling_handler.peer_id().to_string();

    // Spawn task to send messages to client
    let sender_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = ws_sender.send(message).await {
                tracing::error!(error = %e, "Failed to send WebSocket message");
                break;
            }
        }
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(message) => {
                handle_websocket_message(&mut signaling_handler, message).await;
            }
            Err(e) => {
                tracing::error!(peer_id = %peer_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    signaling_handler.cleanup().await;
    sender_task.abort();
    tracing::info!(peer_id = %peer_id, "WebSocket connection closed");
}

async fn handle_websocket_message(signaling_handler: &mut SignalingHandler, message: Message) {
    // Ping/pong/close are handled by warp; only text frames carry protocol
    if let Ok(text) = message.to_str() {
        tracing::debug!(peer_id = %signaling_handler.peer_id(), "Received message: {}", text);
        signaling_handler.handle_text(text).await;
    }
}
