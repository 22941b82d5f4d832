use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tracing::{error, info, warn};
use warp::ws::{Message, WebSocket};

use crate::registry::RoomRegistry;
use grid_types::ClientEvent;

pub mod connection;
pub mod handlers;
pub mod rate_limiter;

#[cfg(test)]
pub mod integration_tests;

use connection::ConnectionId;
pub use connection::ConnectionManager;
use handlers::EventHandler;
use rate_limiter::RateLimiter;

pub async fn handle_connection(
    websocket: WebSocket,
    connections: Arc<ConnectionManager>,
    registry: Arc<RoomRegistry>,
) {
    let connection_id = ConnectionId::new();
    info!("New WebSocket connection: {}", connection_id);

    let (mut ws_sender, mut ws_receiver) = websocket.split();
    let mut rate_limiter = RateLimiter::new();

    let event_receiver = connections.create_connection(connection_id).await;
    let handler = EventHandler::new(connection_id, connections.clone(), registry.clone());

    // Inbound: wire frames to room commands.
    let inbound = {
        let handler = handler.clone();
        async move {
            while let Some(result) = ws_receiver.next().await {
                match result {
                    Ok(msg) => {
                        handle_frame(msg, &mut rate_limiter, &handler).await;
                    }
                    Err(e) => {
                        warn!("WebSocket error for {}: {}", connection_id, e);
                        break;
                    }
                }
            }
        }
    };

    // Outbound: drain the connection's event channel onto the socket.
    let outbound = {
        async move {
            let mut receiver = event_receiver;

            while let Some(event) = receiver.recv().await {
                let json = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize event: {:?}", e);
                        continue;
                    }
                };

                if let Err(e) = ws_sender.send(Message::text(json)).await {
                    warn!("Failed to send event to {}: {:?}", connection_id, e);
                    break;
                }
            }
        }
    };

    tokio::select! {
        _ = inbound => {},
        _ = outbound => {},
    }

    info!("Connection {} disconnected", connection_id);
    handler.handle_disconnect().await;
}

/// A bad frame never tears the socket down; the client gets a reason
/// code and the connection stays up.
async fn handle_frame(msg: Message, rate_limiter: &mut RateLimiter, handler: &EventHandler) {
    if !msg.is_text() {
        return;
    }

    if !rate_limiter.allow() {
        handler.send_rate_limited().await;
        return;
    }

    let Ok(text) = msg.to_str() else {
        return;
    };

    match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => handler.handle_event(event).await,
        Err(e) => {
            handler.send_invalid_payload(e.to_string()).await;
        }
    }
}
