use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};

use grid_types::ServerEvent;

/// Cross-instance broadcast seam. Session logic only ever publishes and
/// subscribes by room code; a single-instance deployment runs the
/// in-memory bus, a multi-instance one swaps in a broker-backed
/// implementation without touching any room code.
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish(&self, room_code: &str, event: ServerEvent);
    async fn subscribe(&self, room_code: &str) -> broadcast::Receiver<ServerEvent>;
    /// Drop the room's channel once the room is gone.
    async fn drop_room(&self, room_code: &str);
}

const ROOM_CHANNEL_CAPACITY: usize = 256;

pub struct InMemoryBus {
    channels: RwLock<HashMap<String, broadcast::Sender<ServerEvent>>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }

    async fn sender_for(&self, room_code: &str) -> broadcast::Sender<ServerEvent> {
        {
            let channels = self.channels.read().await;
            if let Some(sender) = channels.get(room_code) {
                return sender.clone();
            }
        }

        let mut channels = self.channels.write().await;
        channels
            .entry(room_code.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_CHANNEL_CAPACITY).0)
            .clone()
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn publish(&self, room_code: &str, event: ServerEvent) {
        let sender = self.sender_for(room_code).await;
        // No subscribers is fine; nothing is listening to this room here.
        let _ = sender.send(event);
    }

    async fn subscribe(&self, room_code: &str) -> broadcast::Receiver<ServerEvent> {
        self.sender_for(room_code).await.subscribe()
    }

    async fn drop_room(&self, room_code: &str) {
        let mut channels = self.channels.write().await;
        channels.remove(room_code);
    }
}
