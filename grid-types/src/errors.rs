use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Client-facing reason codes for rejected actions. These never tear
/// down the room; they are sent back on the acting connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RoomError {
    RoomNotFound { code: String },
    PlayerNotInRoom,
    UsernameTaken { username: String },
    NotHost,
    WrongPhase { phase: String },
    RoomFull,
    TournamentAlreadyActive,
    NoTournamentActive,
    RateLimitExceeded,
    InvalidPayload { detail: String },
}
