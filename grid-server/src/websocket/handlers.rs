use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::info;

use grid_types::{ClientEvent, PresenceStatus, RoomError, ServerEvent};

use crate::registry::RoomRegistry;
use crate::room_task::RoomCommand;
use crate::websocket::connection::{ConnectionId, ConnectionManager};

/// Per-socket glue between wire events and room commands. Holds no
/// state of its own beyond the socket identity.
#[derive(Clone)]
pub struct EventHandler {
    connection_id: ConnectionId,
    connections: Arc<ConnectionManager>,
    registry: Arc<RoomRegistry>,
}

impl EventHandler {
    pub fn new(
        connection_id: ConnectionId,
        connections: Arc<ConnectionManager>,
        registry: Arc<RoomRegistry>,
    ) -> Self {
        Self {
            connection_id,
            connections,
            registry,
        }
    }

    pub async fn handle_event(&self, event: ClientEvent) {
        self.connections.update_activity(self.connection_id).await;

        match event {
            ClientEvent::CreateRoom {
                player_id,
                username,
                settings,
            } => {
                self.connections
                    .bind_player(self.connection_id, player_id)
                    .await;
                let (code, tx) = self
                    .registry
                    .create_room(player_id, &username, settings.clone())
                    .await;
                self.connections
                    .set_connection_room(self.connection_id, Some(code.clone()))
                    .await;

                let _ = self
                    .connections
                    .send_to_connection(
                        self.connection_id,
                        ServerEvent::RoomCreated {
                            room_code: code,
                            settings,
                        },
                    )
                    .await;

                // Roster snapshot for the creator; later joins arrive as
                // broadcasts.
                let (reply, response) = oneshot::channel();
                if tx.send(RoomCommand::Snapshot { reply }).is_ok() {
                    if let Ok(summary) = response.await {
                        let _ = self
                            .connections
                            .send_to_connection(
                                self.connection_id,
                                ServerEvent::RosterUpdated {
                                    players: summary.players,
                                },
                            )
                            .await;
                    }
                }
            }
            ClientEvent::Join {
                room_code,
                player_id,
                username,
            } => {
                self.connections
                    .bind_player(self.connection_id, player_id)
                    .await;
                let Some(tx) = self.require_room(&room_code).await else {
                    return;
                };

                // Bind the socket to the room up front so the join
                // broadcast reaches this socket too; unbind on failure.
                self.connections
                    .set_connection_room(self.connection_id, Some(room_code.clone()))
                    .await;

                let (reply, response) = oneshot::channel();
                let sent = tx
                    .send(RoomCommand::Join {
                        player_id,
                        username,
                        reply,
                    })
                    .is_ok();

                let outcome = if sent { response.await.ok() } else { None };
                match outcome {
                    Some(Ok(())) => {}
                    Some(Err(error)) => {
                        self.connections
                            .set_connection_room(self.connection_id, None)
                            .await;
                        self.reject(error).await;
                    }
                    // Room task went away between lookup and join.
                    None => {
                        self.connections
                            .set_connection_room(self.connection_id, None)
                            .await;
                        self.reject(RoomError::RoomNotFound { code: room_code }).await;
                    }
                }
            }
            ClientEvent::Leave {
                room_code,
                player_id,
            } => {
                if let Some(tx) = self.registry.get(&room_code).await {
                    let _ = tx.send(RoomCommand::Leave { player_id });
                }
                self.connections
                    .set_connection_room(self.connection_id, None)
                    .await;
            }
            ClientEvent::StartRound {
                room_code,
                player_id,
            } => {
                self.forward(
                    &room_code, RoomCommand::StartRound { player_id })
                    .await;
            }
            ClientEvent::SubmitWord {
                room_code,
                player_id,
                word,
                // Display-only on the wire; scoring recomputes combos
                // from the server clock.
                claimed_combo: _,
            } => {
                self.forward(
                    &room_code,
                    RoomCommand::SubmitWord { player_id, word },
                )
                .await;
            }
            ClientEvent::SubmitWordVote {
                room_code,
                player_id,
                word,
                like,
            } => {
                self.forward(
                    &room_code,
                    RoomCommand::SubmitVote {
                        player_id,
                        word,
                        like,
                    },
                )
                .await;
            }
            ClientEvent::Heartbeat {
                room_code,
                player_id,
            } => {
                self.forward(
                    &room_code, RoomCommand::Heartbeat { player_id })
                    .await;
            }
            ClientEvent::PresenceUpdate {
                room_code,
                player_id,
                status,
            } => {
                self.forward(
                    &room_code,
                    RoomCommand::PresenceUpdate { player_id, status },
                )
                .await;
            }
            ClientEvent::KickPlayer {
                room_code,
                player_id,
                target,
            } => {
                self.forward(
                    &room_code,
                    RoomCommand::Kick { player_id, target },
                )
                .await;
            }
            ClientEvent::TransferHost {
                room_code,
                player_id,
                target,
            } => {
                self.forward(
                    &room_code,
                    RoomCommand::TransferHost { player_id, target },
                )
                .await;
            }
            ClientEvent::CreateTournament {
                room_code,
                player_id,
                rounds,
            } => {
                self.forward(
                    &room_code,
                    RoomCommand::CreateTournament { player_id, rounds },
                )
                .await;
            }
            ClientEvent::CancelTournament {
                room_code,
                player_id,
            } => {
                self.forward(
                    &room_code,
                    RoomCommand::CancelTournament { player_id },
                )
                .await;
            }
            ClientEvent::Reconnect {
                room_code,
                player_id,
            } => {
                self.connections
                    .bind_player(self.connection_id, player_id)
                    .await;
                let Some(tx) = self.require_room(&room_code).await else {
                    return;
                };
                self.connections
                    .set_connection_room(self.connection_id, Some(room_code.clone()))
                    .await;

                let (reply, response) = oneshot::channel();
                let sent = tx
                    .send(RoomCommand::Reconnect { player_id, reply })
                    .is_ok();
                let restored = sent && matches!(response.await, Ok(Ok(())));
                if !restored {
                    self.connections
                        .set_connection_room(self.connection_id, None)
                        .await;
                    self.reject(RoomError::PlayerNotInRoom).await;
                }
            }
        }
    }

    /// Socket went away. The player stays on the roster as disconnected
    /// so they can reconnect into the same seat.
    pub async fn handle_disconnect(&self) {
        let Some((player_id, room_code)) =
            self.connections.remove_connection(self.connection_id).await
        else {
            return;
        };
        let Some(room_code) = room_code else {
            return;
        };

        info!(connection = %self.connection_id, %room_code, "socket dropped, marking disconnected");
        if let Some(tx) = self.registry.get(&room_code).await {
            let _ = tx.send(RoomCommand::PresenceUpdate {
                player_id,
                status: PresenceStatus::Disconnected,
            });
        }
    }

    pub async fn send_rate_limited(&self) {
        let _ = self
            .connections
            .send_to_connection(
                self.connection_id,
                ServerEvent::ActionRejected {
                    error: RoomError::RateLimitExceeded,
                },
            )
            .await;
    }

    pub async fn send_invalid_payload(&self, detail: String) {
        let _ = self
            .connections
            .send_to_connection(
                self.connection_id,
                ServerEvent::ActionRejected {
                    error: RoomError::InvalidPayload { detail },
                },
            )
            .await;
    }

    async fn forward(&self, room_code: &str, command: RoomCommand) {
        if let Some(tx) = self.require_room(room_code).await {
            let _ = tx.send(command);
        }
    }

    async fn require_room(&self, room_code: &str) -> Option<mpsc::UnboundedSender<RoomCommand>> {
        match self.registry.get(room_code).await {
            Some(tx) => Some(tx),
            None => {
                self.reject(RoomError::RoomNotFound {
                    code: room_code.to_string(),
                })
                .await;
                None
            }
        }
    }

    async fn reject(&self, error: RoomError) {
        let _ = self
            .connections
            .send_to_connection(self.connection_id, ServerEvent::ActionRejected { error })
            .await;
    }
}
