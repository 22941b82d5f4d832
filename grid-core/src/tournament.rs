use std::collections::HashMap;

use grid_types::StandingEntry;

/// Sequences N rounds of one room into cumulative standings.
#[derive(Debug, Clone)]
pub struct Tournament {
    total_rounds: u32,
    current_round: u32,
    standings: HashMap<String, i32>,
    complete: bool,
    cancelled: bool,
}

impl Tournament {
    pub fn new(total_rounds: u32) -> Self {
        Self {
            total_rounds,
            current_round: 0,
            standings: HashMap::new(),
            complete: false,
            cancelled: false,
        }
    }

    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn is_active(&self) -> bool {
        !self.complete && !self.cancelled
    }

    /// Merge one round's scores into the standings (sum, not max) and
    /// advance. Completion flips only when the final round is recorded.
    pub fn record_round(&mut self, round_scores: &[(String, i32)]) {
        if !self.is_active() {
            return;
        }

        for (username, score) in round_scores {
            *self.standings.entry(username.clone()).or_insert(0) += score;
        }

        self.current_round += 1;
        if self.current_round >= self.total_rounds {
            self.complete = true;
        }
    }

    /// Explicit and irreversible: no winner is determined.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Standings sorted best-first, ties broken by name for stable output.
    pub fn standings(&self) -> Vec<StandingEntry> {
        let mut entries: Vec<StandingEntry> = self
            .standings
            .iter()
            .map(|(username, &total_score)| StandingEntry {
                username: username.clone(),
                total_score,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.total_score
                .cmp(&a.total_score)
                .then_with(|| a.username.cmp(&b.username))
        });
        entries
    }
}
