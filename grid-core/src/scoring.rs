use std::time::{Duration, Instant};

/// Numeric streak display can climb to this; the scored bonus caps lower.
pub const COMBO_LEVEL_CAP: u32 = 10;
/// Maximum points the combo can ever add, regardless of displayed level.
pub const COMBO_BONUS_CAP: i32 = 5;
pub const DEFAULT_COMBO_WINDOW: Duration = Duration::from_secs(3);

/// Standard length curve: flat for very short words, steep past 8.
pub fn base_score(len: usize) -> i32 {
    match len {
        0 | 1 => 0,
        2 | 3 => 1,
        4 => 2,
        5 => 3,
        6 => 5,
        7 => 7,
        _ => 10 + 3 * (len as i32 - 8),
    }
}

/// Price for a word claimed by more than one player in the same round:
/// half value rounded up, no combo bonus.
pub fn shared_score(len: usize) -> i32 {
    (base_score(len) + 1) / 2
}

/// Full price for a solo word at the given combo level.
pub fn word_score(len: usize, combo_level: u32) -> i32 {
    base_score(len) + combo_bonus(combo_level)
}

/// Bonus add-on for a combo level. Levels above the bonus cap keep the
/// display climbing but add nothing further to score.
pub fn combo_bonus(level: u32) -> i32 {
    (level.saturating_sub(1) as i32).min(COMBO_BONUS_CAP)
}

/// Per-player streak state. Valid words accepted within the rolling
/// window raise the level; any miss resets it.
#[derive(Debug, Clone)]
pub struct ComboState {
    level: u32,
    last_accept: Option<Instant>,
    window: Duration,
}

impl ComboState {
    pub fn new(window: Duration) -> Self {
        Self {
            level: 0,
            last_accept: None,
            window,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// A valid word was accepted at `now`; returns the new level.
    pub fn register_accept(&mut self, now: Instant) -> u32 {
        let within_window = self
            .last_accept
            .is_some_and(|last| now.duration_since(last) <= self.window);

        self.level = if within_window {
            (self.level + 1).min(COMBO_LEVEL_CAP)
        } else {
            1
        };
        self.last_accept = Some(now);
        self.level
    }

    /// Invalid or duplicate submission: streak over.
    pub fn register_miss(&mut self) {
        self.level = 0;
        self.last_accept = None;
    }

    pub fn reset(&mut self) {
        self.register_miss();
    }
}

impl Default for ComboState {
    fn default() -> Self {
        Self::new(DEFAULT_COMBO_WINDOW)
    }
}
