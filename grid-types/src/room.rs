use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::PlayerId;
use crate::verdict::WordRecord;

/// Liveness ladder; every state short of removal keeps the player on the
/// roster so a reconnect can restore them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PresenceStatus {
    Active,
    Idle,
    Afk,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Language {
    English,
    Spanish,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Spanish => "es",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Board dimensions (rows, cols) for this profile.
    pub fn dimensions(&self) -> (usize, usize) {
        match self {
            Difficulty::Easy => (4, 4),
            Difficulty::Medium => (5, 5),
            Difficulty::Hard => (6, 6),
        }
    }

    /// How far the letter distribution is flattened toward rare letters.
    /// 0.0 keeps natural frequency; 1.0 is uniform.
    pub fn letter_skew(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.0,
            Difficulty::Medium => 0.15,
            Difficulty::Hard => 0.35,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoomSettings {
    pub language: Language,
    pub difficulty: Difficulty,
    pub round_seconds: u32,
    pub min_word_len: usize,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            language: Language::English,
            difficulty: Difficulty::Medium,
            round_seconds: 90,
            min_word_len: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub presence: PresenceStatus,
    pub is_host: bool,
    pub score: i32,
    pub combo_level: u32,
    pub joined_at: String, // ISO 8601 string
}

/// Serializable view of the letter board sent with round-started.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GridSnapshot {
    pub rows: usize,
    pub cols: usize,
    /// One string per row.
    pub cells: Vec<String>,
}

/// Finalized per-player record emitted at round end for the storage
/// collaborator to persist independently of the live session.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerRoundResult {
    pub player_id: PlayerId,
    pub username: String,
    pub score: i32,
    pub words: Vec<WordRecord>,
    pub longest_word: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StandingEntry {
    pub username: String,
    pub total_score: i32,
}
