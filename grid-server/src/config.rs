use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub word_lists_dir: String,
    /// Upper bound on `validating` after the round timer expires; any
    /// word still pending when it elapses defaults to rejected.
    pub validating_grace_ms: u64,
    /// Rolling window for combo streaks; server-authoritative, never
    /// taken from client-claimed combo levels.
    pub combo_window_ms: u64,
    pub crowd_vote_threshold: i32,
    pub judge_confidence_threshold: u8,
    pub judge_url: String,
    pub judge_timeout_ms: u64,
    pub idle_after_seconds: u64,
    pub afk_after_seconds: u64,
    pub disconnect_after_seconds: u64,
    pub room_teardown_seconds: u64,
    pub presence_sweep_seconds: u64,
    pub tournament_intermission_seconds: u64,
    pub connection_timeout_seconds: u64,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: &str) -> T
where
    T::Err: std::fmt::Debug,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or_else(|e| panic!("Invalid {}: {:?}", key, e))
}

impl Config {
    pub fn new() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env_parse("PORT", "8080"),
            word_lists_dir: env::var("WORD_LISTS_DIR")
                .unwrap_or_else(|_| "./word_lists".to_string()),
            validating_grace_ms: env_parse("VALIDATING_GRACE_MS", "5000"),
            combo_window_ms: env_parse("COMBO_WINDOW_MS", "3000"),
            crowd_vote_threshold: env_parse("CROWD_VOTE_THRESHOLD", "6"),
            judge_confidence_threshold: env_parse("JUDGE_CONFIDENCE_THRESHOLD", "85"),
            judge_url: env::var("JUDGE_URL")
                .unwrap_or_else(|_| "http://localhost:9090/judge".to_string()),
            judge_timeout_ms: env_parse("JUDGE_TIMEOUT_MS", "4000"),
            idle_after_seconds: env_parse("IDLE_AFTER_SECONDS", "30"),
            afk_after_seconds: env_parse("AFK_AFTER_SECONDS", "90"),
            disconnect_after_seconds: env_parse("DISCONNECT_AFTER_SECONDS", "180"),
            room_teardown_seconds: env_parse("ROOM_TEARDOWN_SECONDS", "600"),
            presence_sweep_seconds: env_parse("PRESENCE_SWEEP_SECONDS", "10"),
            tournament_intermission_seconds: env_parse("TOURNAMENT_INTERMISSION_SECONDS", "8"),
            connection_timeout_seconds: env_parse("CONNECTION_TIMEOUT_SECONDS", "300"),
        }
    }

    pub fn combo_window(&self) -> Duration {
        Duration::from_millis(self.combo_window_ms)
    }

    pub fn validating_grace(&self) -> Duration {
        Duration::from_millis(self.validating_grace_ms)
    }

    pub fn judge_timeout(&self) -> Duration {
        Duration::from_millis(self.judge_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
