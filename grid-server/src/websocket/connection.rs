use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use grid_types::{PlayerId, ServerEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One live socket. Outbound events go through the unbounded sender;
/// the socket task drains the paired receiver.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub player_id: Option<PlayerId>,
    pub room_code: Option<String>,
    pub connected_at: Instant,
    pub last_activity: Instant,
    pub sender: mpsc::UnboundedSender<ServerEvent>,
}

impl Connection {
    pub fn new(id: ConnectionId) -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let now = Instant::now();

        let connection = Self {
            id,
            player_id: None,
            room_code: None,
            connected_at: now,
            last_activity: now,
            sender,
        };

        (connection, receiver)
    }

    pub fn send_event(&self, event: ServerEvent) -> Result<(), String> {
        self.sender
            .send(event)
            .map_err(|_| "Connection closed".to_string())
    }

    pub fn is_inactive(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }
}

/// All live sockets plus the player-to-socket index. A player opening a
/// second socket takes over delivery; the older socket keeps receiving
/// room broadcasts until it closes but stops being the direct-reply
/// target (last writer wins).
pub struct ConnectionManager {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
    player_to_connection: RwLock<HashMap<PlayerId, ConnectionId>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            player_to_connection: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create_connection(
        &self,
        id: ConnectionId,
    ) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (conn, receiver) = Connection::new(id);

        {
            let mut connections = self.connections.write().await;
            connections.insert(id, conn);
        }

        receiver
    }

    /// Remove a socket. Returns the (player, room) it was bound to so
    /// the caller can route a disconnect presence update.
    pub async fn remove_connection(&self, id: ConnectionId) -> Option<(PlayerId, Option<String>)> {
        let removed = {
            let mut connections = self.connections.write().await;
            connections.remove(&id)
        }?;

        let player_id = removed.player_id?;

        let mut player_to_connection = self.player_to_connection.write().await;
        // Only unmap if this socket is still the player's current one.
        if player_to_connection.get(&player_id) == Some(&id) {
            player_to_connection.remove(&player_id);
        }

        Some((player_id, removed.room_code))
    }

    pub async fn get_connection(&self, id: ConnectionId) -> Option<Connection> {
        let connections = self.connections.read().await;
        connections.get(&id).cloned()
    }

    pub async fn bind_player(&self, id: ConnectionId, player_id: PlayerId) {
        {
            let mut connections = self.connections.write().await;
            if let Some(connection) = connections.get_mut(&id) {
                connection.player_id = Some(player_id);
            } else {
                return;
            }
        }

        let mut player_to_connection = self.player_to_connection.write().await;
        player_to_connection.insert(player_id, id);
    }

    pub async fn set_connection_room(&self, id: ConnectionId, room_code: Option<String>) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&id) {
            connection.room_code = room_code;
        }
    }

    /// Rebind the room on whichever socket currently serves the player.
    /// Used when the room removes a player out from under their socket.
    pub async fn set_room_for_player(&self, player_id: PlayerId, room_code: Option<String>) {
        let connection_id = {
            let player_to_connection = self.player_to_connection.read().await;
            player_to_connection.get(&player_id).copied()
        };

        if let Some(connection_id) = connection_id {
            self.set_connection_room(connection_id, room_code).await;
        }
    }

    pub async fn update_activity(&self, id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&id) {
            connection.last_activity = Instant::now();
        }
    }

    pub async fn send_to_connection(
        &self,
        id: ConnectionId,
        event: ServerEvent,
    ) -> Result<(), String> {
        let connections = self.connections.read().await;
        if let Some(connection) = connections.get(&id) {
            connection.send_event(event)
        } else {
            Err("Connection not found".to_string())
        }
    }

    pub async fn send_to_player(
        &self,
        player_id: PlayerId,
        event: ServerEvent,
    ) -> Result<(), String> {
        let connection_id = {
            let player_to_connection = self.player_to_connection.read().await;
            player_to_connection.get(&player_id).copied()
        };

        if let Some(connection_id) = connection_id {
            self.send_to_connection(connection_id, event).await
        } else {
            Err("Player not connected".to_string())
        }
    }

    /// Fan an event out to every socket bound to the room.
    pub async fn send_to_room(&self, room_code: &str, event: ServerEvent) {
        let connections = self.connections.read().await;
        for connection in connections.values() {
            if connection.room_code.as_deref() == Some(room_code) {
                let _ = connection.send_event(event.clone());
            }
        }
    }

    pub async fn cleanup_inactive_connections(&self, timeout: Duration) {
        let inactive: Vec<ConnectionId> = {
            let connections = self.connections.read().await;
            connections
                .values()
                .filter(|conn| conn.is_inactive(timeout))
                .map(|conn| conn.id)
                .collect()
        };

        for connection_id in inactive {
            tracing::info!("Removing inactive connection: {}", connection_id);
            self.remove_connection(connection_id).await;
        }
    }

    pub async fn connection_count(&self) -> usize {
        let connections = self.connections.read().await;
        connections.len()
    }

    pub async fn bound_player_count(&self) -> usize {
        let player_to_connection = self.player_to_connection.read().await;
        player_to_connection.len()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
