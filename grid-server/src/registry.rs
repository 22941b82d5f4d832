use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast::error::RecvError, mpsc, RwLock};
use tracing::{info, warn};

use grid_core::Room;
use grid_types::{PlayerId, RoomSettings};

use crate::arbitration::ArbitrationPipeline;
use crate::bus::MessageBus;
use crate::config::Config;
use crate::room_task::{random_room_code, RoomCommand, RoomTask};
use crate::websocket::ConnectionManager;

/// Owns the code -> room-task index and spawns room actors. Handles are
/// plain command senders; a closed sender means the task has shut down
/// and the entry is garbage for the sweep to collect.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, mpsc::UnboundedSender<RoomCommand>>>,
    arbitration: Arc<ArbitrationPipeline>,
    bus: Arc<dyn MessageBus>,
    connections: Arc<ConnectionManager>,
    config: Arc<Config>,
}

impl RoomRegistry {
    pub fn new(
        arbitration: Arc<ArbitrationPipeline>,
        bus: Arc<dyn MessageBus>,
        connections: Arc<ConnectionManager>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            arbitration,
            bus,
            connections,
            config,
        }
    }

    pub async fn create_room(
        &self,
        host_id: PlayerId,
        host_username: &str,
        settings: RoomSettings,
    ) -> (String, mpsc::UnboundedSender<RoomCommand>) {
        let mut rooms = self.rooms.write().await;

        let code = {
            let mut rng = rand::thread_rng();
            loop {
                let candidate = random_room_code(&mut rng);
                if !rooms.contains_key(&candidate) {
                    break candidate;
                }
            }
        };

        let room = Room::new(
            code.clone(),
            host_id,
            host_username.to_string(),
            settings,
            self.config.combo_window(),
        );
        let tx = RoomTask::spawn(
            room,
            self.bus.clone(),
            self.connections.clone(),
            self.arbitration.clone(),
            self.config.clone(),
        );

        spawn_delivery(code.clone(), self.bus.clone(), self.connections.clone());

        rooms.insert(code.clone(), tx.clone());
        info!(room = %code, host = %host_username, "room created");
        (code, tx)
    }

    pub async fn get(&self, code: &str) -> Option<mpsc::UnboundedSender<RoomCommand>> {
        let rooms = self.rooms.read().await;
        rooms
            .get(code)
            .filter(|sender| !sender.is_closed())
            .cloned()
    }

    pub async fn room_count(&self) -> usize {
        let rooms = self.rooms.read().await;
        rooms.len()
    }

    /// Drop entries whose room task has ended.
    pub async fn sweep(&self) {
        let mut rooms = self.rooms.write().await;
        rooms.retain(|code, sender| {
            let alive = !sender.is_closed();
            if !alive {
                info!(room = %code, "pruning closed room");
            }
            alive
        });
    }
}

/// One forwarder per room: drains the bus subscription into every local
/// socket bound to the room. Ends when the bus drops the room channel.
fn spawn_delivery(
    room_code: String,
    bus: Arc<dyn MessageBus>,
    connections: Arc<ConnectionManager>,
) {
    tokio::spawn(async move {
        let mut events = bus.subscribe(&room_code).await;
        loop {
            match events.recv().await {
                Ok(event) => connections.send_to_room(&room_code, event).await,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(room = %room_code, skipped, "room delivery lagging");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitration::{InMemoryVerdictStore, JudgeClient, JudgeError};
    use async_trait::async_trait;
    use grid_core::{WordLibrary, WordList};
    use grid_types::{JudgeDecision, Language};
    use uuid::Uuid;

    struct NoJudge;

    #[async_trait]
    impl JudgeClient for NoJudge {
        async fn judge(
            &self,
            _word: &str,
            _language: Language,
        ) -> Result<JudgeDecision, JudgeError> {
            Err(JudgeError::Unavailable("offline".to_string()))
        }
    }

    fn registry() -> RoomRegistry {
        let library = Arc::new(WordLibrary::new(vec![WordList::new(
            Language::English,
            "star",
        )]));
        let arbitration = Arc::new(ArbitrationPipeline::new(
            library,
            Arc::new(InMemoryVerdictStore::new()),
            Arc::new(NoJudge),
            6,
            85,
        ));
        RoomRegistry::new(
            arbitration,
            Arc::new(crate::bus::InMemoryBus::new()),
            Arc::new(ConnectionManager::new()),
            Arc::new(Config::default()),
        )
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let registry = registry();
        let (code, _tx) = registry
            .create_room(Uuid::new_v4(), "alice", RoomSettings::default())
            .await;

        assert_eq!(code.len(), 5);
        assert!(registry.get(&code).await.is_some());
        assert!(registry.get("ZZZZZ").await.is_none());
    }

    #[tokio::test]
    async fn test_sweep_prunes_dead_rooms() {
        let registry = registry();
        let host = Uuid::new_v4();
        let (code, tx) = registry
            .create_room(host, "alice", RoomSettings::default())
            .await;

        // The sole player leaving shuts the room task down.
        tx.send(RoomCommand::Leave { player_id: host }).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        assert!(registry.get(&code).await.is_none());
        registry.sweep().await;
        assert_eq!(registry.room_count().await, 0);
    }
}
