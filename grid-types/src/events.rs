use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::errors::RoomError;
use crate::room::{
    GridSnapshot, Player, PlayerRoundResult, PresenceStatus, RoomSettings, StandingEntry,
};
use crate::verdict::SubmitOutcome;
use crate::PlayerId;

/// Inbound events. Every payload names the room and the acting player;
/// the server validates both before any state-machine logic runs.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ClientEvent {
    CreateRoom {
        player_id: PlayerId,
        username: String,
        settings: RoomSettings,
    },
    Join {
        room_code: String,
        player_id: PlayerId,
        username: String,
    },
    Leave {
        room_code: String,
        player_id: PlayerId,
    },
    StartRound {
        room_code: String,
        player_id: PlayerId,
    },
    SubmitWord {
        room_code: String,
        player_id: PlayerId,
        word: String,
        /// Client-side streak display. Never trusted; the server
        /// recomputes combo from its own clock.
        claimed_combo: Option<u32>,
    },
    SubmitWordVote {
        room_code: String,
        player_id: PlayerId,
        word: String,
        like: bool,
    },
    Heartbeat {
        room_code: String,
        player_id: PlayerId,
    },
    PresenceUpdate {
        room_code: String,
        player_id: PlayerId,
        status: PresenceStatus,
    },
    KickPlayer {
        room_code: String,
        player_id: PlayerId,
        target: String,
    },
    TransferHost {
        room_code: String,
        player_id: PlayerId,
        target: String,
    },
    CreateTournament {
        room_code: String,
        player_id: PlayerId,
        rounds: u32,
    },
    CancelTournament {
        room_code: String,
        player_id: PlayerId,
    },
    Reconnect {
        room_code: String,
        player_id: PlayerId,
    },
}

impl ClientEvent {
    /// Room code carried by the payload, if any (create-room has none yet).
    pub fn room_code(&self) -> Option<&str> {
        match self {
            ClientEvent::CreateRoom { .. } => None,
            ClientEvent::Join { room_code, .. }
            | ClientEvent::Leave { room_code, .. }
            | ClientEvent::StartRound { room_code, .. }
            | ClientEvent::SubmitWord { room_code, .. }
            | ClientEvent::SubmitWordVote { room_code, .. }
            | ClientEvent::Heartbeat { room_code, .. }
            | ClientEvent::PresenceUpdate { room_code, .. }
            | ClientEvent::KickPlayer { room_code, .. }
            | ClientEvent::TransferHost { room_code, .. }
            | ClientEvent::CreateTournament { room_code, .. }
            | ClientEvent::CancelTournament { room_code, .. }
            | ClientEvent::Reconnect { room_code, .. } => Some(room_code),
        }
    }

    pub fn player_id(&self) -> PlayerId {
        match self {
            ClientEvent::CreateRoom { player_id, .. }
            | ClientEvent::Join { player_id, .. }
            | ClientEvent::Leave { player_id, .. }
            | ClientEvent::StartRound { player_id, .. }
            | ClientEvent::SubmitWord { player_id, .. }
            | ClientEvent::SubmitWordVote { player_id, .. }
            | ClientEvent::Heartbeat { player_id, .. }
            | ClientEvent::PresenceUpdate { player_id, .. }
            | ClientEvent::KickPlayer { player_id, .. }
            | ClientEvent::TransferHost { player_id, .. }
            | ClientEvent::CreateTournament { player_id, .. }
            | ClientEvent::CancelTournament { player_id, .. }
            | ClientEvent::Reconnect { player_id, .. } => *player_id,
        }
    }
}

/// Outbound events mirroring state transitions.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ServerEvent {
    RoomCreated {
        room_code: String,
        settings: RoomSettings,
    },
    RosterUpdated {
        players: Vec<Player>,
    },
    RoundStarted {
        round: u32,
        grid: GridSnapshot,
        ends_in_ms: u64,
    },
    /// Timer expired; in-flight arbitrations are being drained.
    ValidatingStarted {
        round: u32,
    },
    WordResult {
        username: String,
        outcome: SubmitOutcome,
    },
    RoundResults {
        round: u32,
        results: Vec<PlayerRoundResult>,
    },
    TournamentStandings {
        current_round: u32,
        total_rounds: u32,
        standings: Vec<StandingEntry>,
        complete: bool,
    },
    TournamentCancelled,
    HostChanged {
        username: String,
    },
    PresenceChanged {
        username: String,
        status: PresenceStatus,
    },
    PlayerKicked {
        username: String,
    },
    RoomClosed {
        reason: String,
    },
    ActionRejected {
        error: RoomError,
    },
    Pong,
}
