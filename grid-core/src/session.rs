use std::collections::{HashMap, HashSet};
use std::time::Instant;

use tracing::info;

use grid_types::{
    Player, PlayerId, PlayerRoundResult, PresenceStatus, RejectReason, RoomError, RoomSettings,
    SubmitOutcome, WordRecord, WordVerdict,
};

use crate::dictionary::normalize_word;
use crate::grid::Grid;
use crate::scoring::{self, ComboState};
use crate::tournament::Tournament;

pub const MAX_PLAYERS_PER_ROOM: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Lobby,
    Starting,
    Playing,
    Validating,
    Results,
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::Lobby => "lobby",
            SessionPhase::Starting => "starting",
            SessionPhase::Playing => "playing",
            SessionPhase::Validating => "validating",
            SessionPhase::Results => "results",
        }
    }
}

/// Outcome of the synchronous part of a submission. Structural failures
/// and duplicates resolve immediately; everything else goes to the
/// arbitration pipeline.
#[derive(Debug, Clone)]
pub enum SubmitStep {
    Resolved(SubmitOutcome),
    NeedsArbitration { normalized: String },
}

#[derive(Debug)]
struct RoomPlayer {
    id: PlayerId,
    username: String,
    presence: PresenceStatus,
    joined_at: String, // ISO 8601 string
    round_score: i32,
    combo: ComboState,
    /// Every normalized word this player has submitted this round,
    /// regardless of verdict. Guarantees at most one score per word.
    ledger: HashSet<String>,
    words: Vec<WordRecord>,
}

impl RoomPlayer {
    fn new(id: PlayerId, username: String, combo_window: std::time::Duration) -> Self {
        Self {
            id,
            username,
            presence: PresenceStatus::Active,
            joined_at: chrono::Utc::now().to_rfc3339(),
            round_score: 0,
            combo: ComboState::new(combo_window),
            ledger: HashSet::new(),
            words: Vec::new(),
        }
    }

    fn reset_round(&mut self) {
        self.round_score = 0;
        self.combo.reset();
        self.ledger.clear();
        self.words.clear();
    }
}

/// Authoritative per-room state: roster, host, phase, grid, scores.
/// Purely synchronous; the server task owns timers and arbitration.
pub struct Room {
    pub code: String,
    pub settings: RoomSettings,
    phase: SessionPhase,
    round: u32,
    grid: Option<Grid>,
    players: Vec<RoomPlayer>,
    host: PlayerId,
    /// Accepted words this round -> claimants, for shared-word pricing.
    claims: HashMap<String, Vec<PlayerId>>,
    combo_window: std::time::Duration,
    pub tournament: Option<Tournament>,
}

impl Room {
    pub fn new(
        code: String,
        host_id: PlayerId,
        host_username: String,
        settings: RoomSettings,
        combo_window: std::time::Duration,
    ) -> Self {
        let host = RoomPlayer::new(host_id, host_username, combo_window);
        Self {
            code,
            settings,
            phase: SessionPhase::Lobby,
            round: 0,
            grid: None,
            players: vec![host],
            host: host_id,
            claims: HashMap::new(),
            combo_window,
            tournament: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    pub fn host_id(&self) -> PlayerId {
        self.host
    }

    pub fn is_host(&self, player_id: PlayerId) -> bool {
        self.host == player_id
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn contains_player(&self, player_id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    pub fn username_of(&self, player_id: PlayerId) -> Option<&str> {
        self.players
            .iter()
            .find(|p| p.id == player_id)
            .map(|p| p.username.as_str())
    }

    fn player_mut(&mut self, player_id: PlayerId) -> Result<&mut RoomPlayer, RoomError> {
        self.players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or(RoomError::PlayerNotInRoom)
    }

    fn wrong_phase(&self) -> RoomError {
        RoomError::WrongPhase {
            phase: self.phase.name().to_string(),
        }
    }

    /// Wire-shaped roster in join order (join order is tenure order).
    pub fn roster(&self) -> Vec<Player> {
        self.players
            .iter()
            .map(|p| Player {
                id: p.id,
                username: p.username.clone(),
                presence: p.presence,
                is_host: p.id == self.host,
                score: p.round_score,
                combo_level: p.combo.level(),
                joined_at: p.joined_at.clone(),
            })
            .collect()
    }

    // --- roster management ---

    /// Join or rejoin. Rejoining with a known player id restores prior
    /// state (score, combo, ledger) instead of adding a second entry.
    pub fn add_player(&mut self, player_id: PlayerId, username: &str) -> Result<(), RoomError> {
        if let Some(existing) = self.players.iter_mut().find(|p| p.id == player_id) {
            existing.presence = PresenceStatus::Active;
            return Ok(());
        }

        if self.players.len() >= MAX_PLAYERS_PER_ROOM {
            return Err(RoomError::RoomFull);
        }

        if self.players.iter().any(|p| p.username == username) {
            return Err(RoomError::UsernameTaken {
                username: username.to_string(),
            });
        }

        self.players.push(RoomPlayer::new(
            player_id,
            username.to_string(),
            self.combo_window,
        ));
        Ok(())
    }

    /// Remove a player. Returns (username, new host username if the host
    /// role moved).
    pub fn remove_player(&mut self, player_id: PlayerId) -> Option<(String, Option<String>)> {
        let index = self.players.iter().position(|p| p.id == player_id)?;
        let removed = self.players.remove(index);

        let new_host = if removed.id == self.host {
            self.reassign_host()
        } else {
            None
        };
        Some((removed.username, new_host))
    }

    pub fn kick(&mut self, by: PlayerId, target: &str) -> Result<String, RoomError> {
        if !self.is_host(by) {
            return Err(RoomError::NotHost);
        }
        let target_id = self
            .players
            .iter()
            .find(|p| p.username == target)
            .map(|p| p.id)
            .ok_or(RoomError::PlayerNotInRoom)?;

        let (username, _) = self
            .remove_player(target_id)
            .ok_or(RoomError::PlayerNotInRoom)?;
        Ok(username)
    }

    pub fn transfer_host(&mut self, by: PlayerId, target: &str) -> Result<String, RoomError> {
        if !self.is_host(by) {
            return Err(RoomError::NotHost);
        }
        let target_player = self
            .players
            .iter()
            .find(|p| p.username == target)
            .ok_or(RoomError::PlayerNotInRoom)?;

        self.host = target_player.id;
        Ok(target_player.username.clone())
    }

    /// Hand the host role to the longest-tenured active player (falling
    /// back to any non-disconnected player). Returns the new host's name.
    pub fn reassign_host(&mut self) -> Option<String> {
        let next = self
            .players
            .iter()
            .find(|p| p.presence == PresenceStatus::Active)
            .or_else(|| {
                self.players
                    .iter()
                    .find(|p| p.presence != PresenceStatus::Disconnected)
            })?;

        self.host = next.id;
        Some(next.username.clone())
    }

    pub fn set_presence(
        &mut self,
        player_id: PlayerId,
        status: PresenceStatus,
    ) -> Result<(String, bool), RoomError> {
        let player = self.player_mut(player_id)?;
        let changed = player.presence != status;
        player.presence = status;
        Ok((player.username.clone(), changed))
    }

    pub fn presence_of(&self, player_id: PlayerId) -> Option<PresenceStatus> {
        self.players
            .iter()
            .find(|p| p.id == player_id)
            .map(|p| p.presence)
    }

    pub fn all_disconnected(&self) -> bool {
        !self.players.is_empty()
            && self
                .players
                .iter()
                .all(|p| p.presence == PresenceStatus::Disconnected)
    }

    // --- phase transitions ---

    /// Host requests a round. Only the host may leave the lobby.
    pub fn start(&mut self, by: PlayerId) -> Result<(), RoomError> {
        if !self.is_host(by) {
            return Err(RoomError::NotHost);
        }
        match self.phase {
            SessionPhase::Lobby | SessionPhase::Results => {
                self.phase = SessionPhase::Starting;
                Ok(())
            }
            _ => Err(self.wrong_phase()),
        }
    }

    /// Enter `playing` with a freshly generated grid. The grid argument
    /// is the only way in, so a round can never reuse a stale board.
    pub fn begin_round(&mut self, grid: Grid) -> Result<u32, RoomError> {
        if self.phase != SessionPhase::Starting {
            return Err(self.wrong_phase());
        }

        self.round += 1;
        self.grid = Some(grid);
        self.claims.clear();
        for player in &mut self.players {
            player.reset_round();
        }
        self.phase = SessionPhase::Playing;
        info!(room = %self.code, round = self.round, "round started");
        Ok(self.round)
    }

    /// Authoritative server-side timer expired.
    pub fn expire_timer(&mut self) -> Result<(), RoomError> {
        if self.phase != SessionPhase::Playing {
            return Err(self.wrong_phase());
        }
        self.phase = SessionPhase::Validating;
        Ok(())
    }

    /// Submissions are accepted while playing; late arrivals during
    /// validating are resolved rather than dropped.
    pub fn accepts_submissions(&self) -> bool {
        matches!(
            self.phase,
            SessionPhase::Playing | SessionPhase::Validating
        )
    }

    // --- submissions ---

    /// Synchronous half of a submission: normalization, duplicate
    /// ledger, length gate, grid-path legality. Anything that survives
    /// needs arbitration.
    pub fn submit(&mut self, player_id: PlayerId, raw: &str) -> Result<SubmitStep, RoomError> {
        if !self.accepts_submissions() {
            return Err(self.wrong_phase());
        }
        if !self.contains_player(player_id) {
            return Err(RoomError::PlayerNotInRoom);
        }

        let normalized = normalize_word(raw, self.settings.language);
        let min_len = self.settings.min_word_len;

        // Duplicate check first: an already-submitted word is never
        // re-validated, whatever its prior verdict was.
        let already = self
            .players
            .iter()
            .find(|p| p.id == player_id)
            .is_some_and(|p| p.ledger.contains(&normalized));
        if already {
            let player = self.player_mut(player_id)?;
            player.combo.register_miss();
            return Ok(SubmitStep::Resolved(SubmitOutcome {
                word: normalized,
                verdict: WordVerdict::Duplicate,
                score: 0,
                combo_level: 0,
            }));
        }

        // Ledger entry goes in now so a racing identical submission from
        // the same player resolves as a duplicate.
        self.player_mut(player_id)?.ledger.insert(normalized.clone());

        if normalized.chars().count() < min_len {
            return Ok(self.reject(player_id, normalized, RejectReason::TooShort));
        }

        let on_grid = self
            .grid
            .as_ref()
            .is_some_and(|grid| grid.has_path(&normalized));
        if !on_grid {
            return Ok(self.reject(player_id, normalized, RejectReason::NotOnGrid));
        }

        Ok(SubmitStep::NeedsArbitration { normalized })
    }

    fn reject(
        &mut self,
        player_id: PlayerId,
        normalized: String,
        reason: RejectReason,
    ) -> SubmitStep {
        // player existence was checked by the caller
        if let Ok(player) = self.player_mut(player_id) {
            player.combo.register_miss();
            player.words.push(WordRecord {
                word: normalized.clone(),
                verdict: WordVerdict::Rejected {
                    reason: reason.clone(),
                },
                score: 0,
            });
        }
        SubmitStep::Resolved(SubmitOutcome {
            word: normalized,
            verdict: WordVerdict::Rejected { reason },
            score: 0,
            combo_level: 0,
        })
    }

    /// Apply an arbitration ruling. `now` is the server clock used for
    /// combo windows; client-claimed timings are never consulted.
    pub fn resolve(
        &mut self,
        player_id: PlayerId,
        normalized: &str,
        valid: bool,
        reject_reason: Option<RejectReason>,
        now: Instant,
    ) -> Result<SubmitOutcome, RoomError> {
        if !valid {
            let reason = reject_reason.unwrap_or(RejectReason::NotAWord);
            let SubmitStep::Resolved(outcome) =
                self.reject(player_id, normalized.to_string(), reason)
            else {
                unreachable!("reject always resolves");
            };
            return Ok(outcome);
        }

        let shared_with_others = self
            .claims
            .get(normalized)
            .is_some_and(|claimants| claimants.iter().any(|&id| id != player_id));

        let len = normalized.chars().count();
        let player = self.player_mut(player_id)?;
        let combo_level = player.combo.register_accept(now);

        let (verdict, score) = if shared_with_others {
            // Later claimants price at shared value straight away; the
            // first claimant is re-priced when the round finalizes.
            (WordVerdict::Shared, scoring::shared_score(len))
        } else {
            (WordVerdict::Accepted, scoring::word_score(len, combo_level))
        };

        player.round_score += score;
        player.words.push(WordRecord {
            word: normalized.to_string(),
            verdict: verdict.clone(),
            score,
        });

        self.claims
            .entry(normalized.to_string())
            .or_default()
            .push(player_id);

        Ok(SubmitOutcome {
            word: normalized.to_string(),
            verdict,
            score,
            combo_level,
        })
    }

    // --- round finalization ---

    /// Close out the round: re-price multi-claimant words, build the
    /// per-player result records, and feed the tournament if one is
    /// running. Validating -> Results.
    pub fn finalize_round(&mut self) -> Result<Vec<PlayerRoundResult>, RoomError> {
        if self.phase != SessionPhase::Validating {
            return Err(self.wrong_phase());
        }

        // Words claimed by several players settle at shared value for
        // every claimant, including the one who got there first.
        for (word, claimants) in &self.claims {
            if claimants.len() < 2 {
                continue;
            }
            let target = scoring::shared_score(word.chars().count());
            for &claimant in claimants {
                if let Some(player) = self.players.iter_mut().find(|p| p.id == claimant) {
                    if let Some(record) = player.words.iter_mut().find(|r| &r.word == word) {
                        player.round_score += target - record.score;
                        record.score = target;
                        record.verdict = WordVerdict::Shared;
                    }
                }
            }
        }

        let results: Vec<PlayerRoundResult> = self
            .players
            .iter()
            .map(|p| {
                let longest_word = p
                    .words
                    .iter()
                    .filter(|r| {
                        matches!(r.verdict, WordVerdict::Accepted | WordVerdict::Shared)
                    })
                    .max_by_key(|r| r.word.chars().count())
                    .map(|r| r.word.clone());
                PlayerRoundResult {
                    player_id: p.id,
                    username: p.username.clone(),
                    score: p.round_score,
                    words: p.words.clone(),
                    longest_word,
                }
            })
            .collect();

        if let Some(tournament) = self.tournament.as_mut() {
            if tournament.is_active() {
                let scores = results
                    .iter()
                    .map(|r| (r.username.clone(), r.score))
                    .collect::<Vec<_>>();
                tournament.record_round(&scores);
            }
        }

        self.phase = SessionPhase::Results;
        info!(room = %self.code, round = self.round, "round finalized");
        Ok(results)
    }

    pub fn return_to_lobby(&mut self) -> Result<(), RoomError> {
        if self.phase != SessionPhase::Results {
            return Err(self.wrong_phase());
        }
        self.phase = SessionPhase::Lobby;
        Ok(())
    }

    // --- tournaments ---

    pub fn create_tournament(&mut self, by: PlayerId, rounds: u32) -> Result<(), RoomError> {
        if !self.is_host(by) {
            return Err(RoomError::NotHost);
        }
        if self.tournament.as_ref().is_some_and(|t| t.is_active()) {
            return Err(RoomError::TournamentAlreadyActive);
        }
        if rounds == 0 {
            return Err(RoomError::InvalidPayload {
                detail: "tournament needs at least one round".to_string(),
            });
        }
        self.tournament = Some(Tournament::new(rounds));
        Ok(())
    }

    /// Irreversible: ends the tournament without a winner and returns
    /// the room to casual play.
    pub fn cancel_tournament(&mut self, by: PlayerId) -> Result<(), RoomError> {
        if !self.is_host(by) {
            return Err(RoomError::NotHost);
        }
        match self.tournament.as_mut() {
            Some(tournament) if tournament.is_active() => {
                tournament.cancel();
                Ok(())
            }
            _ => Err(RoomError::NoTournamentActive),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_room() -> (Room, PlayerId) {
        let host = Uuid::new_v4();
        let room = Room::new(
            "AB12C".to_string(),
            host,
            "alice".to_string(),
            RoomSettings::default(),
            scoring::DEFAULT_COMBO_WINDOW,
        );
        (room, host)
    }

    fn star_grid() -> Grid {
        // s t a r
        // x x x x
        // d o g s
        Grid::from_rows(&["star", "xxxx", "dogs"])
    }

    fn playing_room() -> (Room, PlayerId, PlayerId) {
        let (mut room, host) = test_room();
        let bob = Uuid::new_v4();
        room.add_player(bob, "bob").unwrap();
        room.start(host).unwrap();
        room.begin_round(star_grid()).unwrap();
        (room, host, bob)
    }

    #[test]
    fn test_host_only_start() {
        let (mut room, host) = test_room();
        let bob = Uuid::new_v4();
        room.add_player(bob, "bob").unwrap();

        assert_eq!(room.start(bob), Err(RoomError::NotHost));
        assert!(room.start(host).is_ok());
        assert_eq!(room.phase(), SessionPhase::Starting);
    }

    #[test]
    fn test_username_unique_within_room() {
        let (mut room, _) = test_room();
        let result = room.add_player(Uuid::new_v4(), "alice");
        assert!(matches!(result, Err(RoomError::UsernameTaken { .. })));
    }

    #[test]
    fn test_rejoin_restores_state() {
        let (mut room, host, bob) = playing_room();
        let _ = host;

        let now = Instant::now();
        assert!(matches!(
            room.submit(bob, "star").unwrap(),
            SubmitStep::NeedsArbitration { .. }
        ));
        room.resolve(bob, "star", true, None, now).unwrap();

        room.set_presence(bob, PresenceStatus::Disconnected).unwrap();
        room.add_player(bob, "bob").unwrap(); // rejoin

        assert_eq!(room.presence_of(bob), Some(PresenceStatus::Active));
        let roster = room.roster();
        let bob_entry = roster.iter().find(|p| p.username == "bob").unwrap();
        assert_eq!(bob_entry.score, scoring::word_score(4, 1));
        assert_eq!(room.player_count(), 2);
    }

    #[test]
    fn test_submissions_rejected_outside_playing() {
        let (mut room, host) = test_room();
        let result = room.submit(host, "star");
        assert!(matches!(result, Err(RoomError::WrongPhase { .. })));
    }

    #[test]
    fn test_begin_round_requires_starting_phase() {
        let (mut room, _) = test_room();
        assert!(room.begin_round(star_grid()).is_err());
    }

    #[test]
    fn test_duplicate_submission_idempotence() {
        let (mut room, _, bob) = playing_room();
        let now = Instant::now();

        let step = room.submit(bob, "star").unwrap();
        assert!(matches!(step, SubmitStep::NeedsArbitration { .. }));
        let outcome = room.resolve(bob, "star", true, None, now).unwrap();
        assert_eq!(outcome.verdict, WordVerdict::Accepted);

        // Second submission of the same word: duplicate, never (valid,
        // valid), and the combo resets.
        let step = room.submit(bob, "STAR").unwrap();
        let SubmitStep::Resolved(outcome) = step else {
            panic!("duplicate must resolve synchronously");
        };
        assert_eq!(outcome.verdict, WordVerdict::Duplicate);
        assert_eq!(outcome.score, 0);
        assert_eq!(outcome.combo_level, 0);
    }

    #[test]
    fn test_too_short_rejected_before_arbitration() {
        let (mut room, _, bob) = playing_room();
        let SubmitStep::Resolved(outcome) = room.submit(bob, "st").unwrap() else {
            panic!("short word must resolve synchronously");
        };
        assert_eq!(
            outcome.verdict,
            WordVerdict::Rejected {
                reason: RejectReason::TooShort
            }
        );
    }

    #[test]
    fn test_off_grid_rejected_structurally() {
        let (mut room, _, bob) = playing_room();
        let SubmitStep::Resolved(outcome) = room.submit(bob, "zzzz").unwrap() else {
            panic!("off-grid word must resolve synchronously");
        };
        assert_eq!(
            outcome.verdict,
            WordVerdict::Rejected {
                reason: RejectReason::NotOnGrid
            }
        );
    }

    #[test]
    fn test_shared_word_prices_both_claimants() {
        let (mut room, host, bob) = playing_room();
        let now = Instant::now();

        for player in [host, bob] {
            assert!(matches!(
                room.submit(player, "star").unwrap(),
                SubmitStep::NeedsArbitration { .. }
            ));
        }

        let first = room.resolve(host, "star", true, None, now).unwrap();
        assert_eq!(first.verdict, WordVerdict::Accepted);

        let second = room.resolve(bob, "star", true, None, now).unwrap();
        assert_eq!(second.verdict, WordVerdict::Shared);
        assert_eq!(second.score, scoring::shared_score(4));

        room.expire_timer().unwrap();
        let results = room.finalize_round().unwrap();

        // Neither player keeps solo value; the word lists for both.
        for result in &results {
            let record = result.words.iter().find(|r| r.word == "star").unwrap();
            assert_eq!(record.verdict, WordVerdict::Shared);
            assert_eq!(record.score, scoring::shared_score(4));
            assert_eq!(result.score, scoring::shared_score(4));
        }
    }

    #[test]
    fn test_round_results_longest_word() {
        let (mut room, _, bob) = playing_room();
        let now = Instant::now();

        room.submit(bob, "dog").unwrap();
        room.resolve(bob, "dog", true, None, now).unwrap();
        room.submit(bob, "dogs").unwrap();
        room.resolve(bob, "dogs", true, None, now).unwrap();
        // Rejected words never count for longest.
        room.submit(bob, "stard").unwrap();

        room.expire_timer().unwrap();
        let results = room.finalize_round().unwrap();
        let bob_result = results.iter().find(|r| r.username == "bob").unwrap();
        assert_eq!(bob_result.longest_word.as_deref(), Some("dogs"));
        assert_eq!(bob_result.words.len(), 3);
    }

    #[test]
    fn test_host_reassignment_on_disconnect() {
        let (mut room, host, bob) = playing_room();
        let carol = Uuid::new_v4();
        room.add_player(carol, "carol").unwrap();

        room.set_presence(host, PresenceStatus::Disconnected).unwrap();
        let new_host = room.reassign_host().unwrap();

        // bob joined before carol: longest-tenured active player wins.
        assert_eq!(new_host, "bob");
        assert!(room.is_host(bob));
    }

    #[test]
    fn test_kick_requires_host() {
        let (mut room, host, bob) = playing_room();
        assert_eq!(room.kick(bob, "alice"), Err(RoomError::NotHost));
        assert_eq!(room.kick(host, "bob").unwrap(), "bob");
        assert!(!room.contains_player(bob));
    }

    #[test]
    fn test_transfer_host() {
        let (mut room, host, bob) = playing_room();
        room.transfer_host(host, "bob").unwrap();
        assert!(room.is_host(bob));
        assert_eq!(room.transfer_host(host, "alice"), Err(RoomError::NotHost));
    }

    #[test]
    fn test_fresh_grid_and_state_every_round() {
        let (mut room, host, bob) = playing_room();
        let now = Instant::now();

        room.submit(bob, "star").unwrap();
        room.resolve(bob, "star", true, None, now).unwrap();
        room.expire_timer().unwrap();
        room.finalize_round().unwrap();

        room.start(host).unwrap();
        room.begin_round(star_grid()).unwrap();
        assert_eq!(room.round(), 2);

        // Ledger cleared: the same word validates again next round.
        let step = room.submit(bob, "star").unwrap();
        assert!(matches!(step, SubmitStep::NeedsArbitration { .. }));
    }

    #[test]
    fn test_late_submissions_accepted_during_validating() {
        let (mut room, _, bob) = playing_room();
        room.expire_timer().unwrap();
        assert!(room.accepts_submissions());

        let step = room.submit(bob, "star").unwrap();
        assert!(matches!(step, SubmitStep::NeedsArbitration { .. }));
    }

    #[test]
    fn test_tournament_lifecycle_in_room() {
        let (mut room, host) = test_room();
        let bob = Uuid::new_v4();
        room.add_player(bob, "bob").unwrap();

        assert_eq!(
            room.create_tournament(bob, 3),
            Err(RoomError::NotHost)
        );
        room.create_tournament(host, 3).unwrap();
        assert_eq!(
            room.create_tournament(host, 2),
            Err(RoomError::TournamentAlreadyActive)
        );

        room.cancel_tournament(host).unwrap();
        assert_eq!(
            room.cancel_tournament(host),
            Err(RoomError::NoTournamentActive)
        );
        // Cancelled tournament can be replaced by a new one.
        assert!(room.create_tournament(host, 2).is_ok());
    }
}
