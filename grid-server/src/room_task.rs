use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use grid_core::{Grid, Room, SessionPhase, SubmitStep};
use grid_types::{
    Player, PlayerId, PresenceStatus, RejectReason, RoomError, RoomSettings, ServerEvent,
    SubmitOutcome,
};

use crate::arbitration::{ArbitrationPipeline, Ruling};
use crate::bus::MessageBus;
use crate::config::Config;
use crate::presence::PresencePolicy;
use crate::websocket::ConnectionManager;

/// Everything a room can be asked to do, plus the internal callbacks
/// its timers and arbitration tasks send back to it. The room task is
/// the only writer of room state; commands serialize all mutation.
#[derive(Debug)]
pub enum RoomCommand {
    Join {
        player_id: PlayerId,
        username: String,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Leave {
        player_id: PlayerId,
    },
    StartRound {
        player_id: PlayerId,
    },
    SubmitWord {
        player_id: PlayerId,
        word: String,
    },
    SubmitVote {
        player_id: PlayerId,
        word: String,
        like: bool,
    },
    Heartbeat {
        player_id: PlayerId,
    },
    PresenceUpdate {
        player_id: PlayerId,
        status: PresenceStatus,
    },
    Kick {
        player_id: PlayerId,
        target: String,
    },
    TransferHost {
        player_id: PlayerId,
        target: String,
    },
    CreateTournament {
        player_id: PlayerId,
        rounds: u32,
    },
    CancelTournament {
        player_id: PlayerId,
    },
    Reconnect {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    TimerExpired {
        round: u32,
    },
    ValidationDeadline {
        round: u32,
    },
    WordResolved {
        player_id: PlayerId,
        round: u32,
        word: String,
        ruling: Ruling,
    },
    NextTournamentRound,
    Snapshot {
        reply: oneshot::Sender<RoomSummary>,
    },
}

/// Read-only view for the HTTP surface.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSummary {
    pub code: String,
    pub phase: String,
    pub round: u32,
    pub players: Vec<Player>,
    pub settings: RoomSettings,
}

pub struct RoomTask {
    room: Room,
    rx: mpsc::UnboundedReceiver<RoomCommand>,
    self_tx: mpsc::UnboundedSender<RoomCommand>,
    bus: Arc<dyn MessageBus>,
    connections: Arc<ConnectionManager>,
    arbitration: Arc<ArbitrationPipeline>,
    config: Arc<Config>,
    policy: PresencePolicy,
    /// Server clock of the last inbound action per player.
    last_seen: HashMap<PlayerId, Instant>,
    /// Submissions handed to the arbitration pipeline this round.
    pending: HashSet<(PlayerId, String)>,
    round_deadline: Option<Instant>,
    all_disconnected_since: Option<Instant>,
    close_reason: String,
}

impl RoomTask {
    pub fn spawn(
        room: Room,
        bus: Arc<dyn MessageBus>,
        connections: Arc<ConnectionManager>,
        arbitration: Arc<ArbitrationPipeline>,
        config: Arc<Config>,
    ) -> mpsc::UnboundedSender<RoomCommand> {
        let (tx, rx) = mpsc::unbounded_channel();
        let policy = PresencePolicy::from_config(&config);
        let task = Self {
            room,
            rx,
            self_tx: tx.clone(),
            bus,
            connections,
            arbitration,
            config,
            policy,
            last_seen: HashMap::new(),
            pending: HashSet::new(),
            round_deadline: None,
            all_disconnected_since: None,
            close_reason: "room closed".to_string(),
        };
        tokio::spawn(task.run());
        tx
    }

    async fn run(mut self) {
        self.last_seen.insert(self.room.host_id(), Instant::now());

        let sweep_every = Duration::from_secs(self.config.presence_sweep_seconds.max(1));
        let mut sweep = tokio::time::interval(sweep_every);
        sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.rx.recv() => {
                    match cmd {
                        Some(cmd) => {
                            if !self.handle(cmd).await {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = sweep.tick() => {
                    if !self.sweep_presence().await {
                        break;
                    }
                }
            }
        }

        self.publish(ServerEvent::RoomClosed {
            reason: self.close_reason.clone(),
        })
        .await;
        self.bus.drop_room(&self.room.code).await;
        info!(room = %self.room.code, reason = %self.close_reason, "room closed");
    }

    /// Returns false when the room should shut down.
    async fn handle(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join {
                player_id,
                username,
                reply,
            } => {
                let result = self.room.add_player(player_id, &username);
                let ok = result.is_ok();
                let _ = reply.send(result);
                if ok {
                    self.last_seen.insert(player_id, Instant::now());
                    self.all_disconnected_since = None;
                    self.broadcast_roster().await;
                }
            }
            RoomCommand::Leave { player_id } => {
                if let Some((username, new_host)) = self.room.remove_player(player_id) {
                    self.last_seen.remove(&player_id);
                    info!(room = %self.room.code, %username, "player left");
                    if self.room.is_empty() {
                        self.close_reason = "all players left".to_string();
                        return false;
                    }
                    self.broadcast_roster().await;
                    if let Some(username) = new_host {
                        self.publish(ServerEvent::HostChanged { username }).await;
                    }
                }
            }
            RoomCommand::StartRound { player_id } => {
                self.touch(player_id).await;
                if let Err(error) = self.start_round(player_id).await {
                    self.reject(player_id, error).await;
                }
            }
            RoomCommand::SubmitWord { player_id, word } => {
                self.touch(player_id).await;
                match self.room.submit(player_id, &word) {
                    Ok(SubmitStep::Resolved(outcome)) => {
                        self.broadcast_word_result(player_id, outcome).await;
                    }
                    Ok(SubmitStep::NeedsArbitration { normalized }) => {
                        self.spawn_arbitration(player_id, normalized);
                    }
                    Err(error) => self.reject(player_id, error).await,
                }
            }
            RoomCommand::SubmitVote {
                player_id,
                word,
                like,
            } => {
                self.touch(player_id).await;
                let language = self.room.settings.language;
                let normalized = grid_core::normalize_word(&word, language);
                self.arbitration.record_vote(&normalized, language, like).await;
            }
            RoomCommand::Heartbeat { player_id } => {
                self.heartbeat_seen(player_id).await;
                let _ = self
                    .connections
                    .send_to_player(player_id, ServerEvent::Pong)
                    .await;
            }
            RoomCommand::PresenceUpdate { player_id, status } => {
                self.apply_presence(player_id, status).await;
            }
            RoomCommand::Kick { player_id, target } => {
                self.touch(player_id).await;
                let target_id = self
                    .room
                    .roster()
                    .iter()
                    .find(|p| p.username == target)
                    .map(|p| p.id);
                match self.room.kick(player_id, &target) {
                    Ok(username) => {
                        if let Some(target_id) = target_id {
                            self.last_seen.remove(&target_id);
                            let _ = self
                                .connections
                                .send_to_player(
                                    target_id,
                                    ServerEvent::PlayerKicked {
                                        username: username.clone(),
                                    },
                                )
                                .await;
                            self.connections.set_room_for_player(target_id, None).await;
                        }
                        self.publish(ServerEvent::PlayerKicked { username }).await;
                        self.broadcast_roster().await;
                    }
                    Err(error) => self.reject(player_id, error).await,
                }
            }
            RoomCommand::TransferHost { player_id, target } => {
                self.touch(player_id).await;
                match self.room.transfer_host(player_id, &target) {
                    Ok(username) => {
                        self.publish(ServerEvent::HostChanged { username }).await;
                        self.broadcast_roster().await;
                    }
                    Err(error) => self.reject(player_id, error).await,
                }
            }
            RoomCommand::CreateTournament { player_id, rounds } => {
                self.touch(player_id).await;
                match self.room.create_tournament(player_id, rounds) {
                    Ok(()) => {
                        self.publish(ServerEvent::TournamentStandings {
                            current_round: 0,
                            total_rounds: rounds,
                            standings: Vec::new(),
                            complete: false,
                        })
                        .await;
                    }
                    Err(error) => self.reject(player_id, error).await,
                }
            }
            RoomCommand::CancelTournament { player_id } => {
                self.touch(player_id).await;
                match self.room.cancel_tournament(player_id) {
                    Ok(()) => self.publish(ServerEvent::TournamentCancelled).await,
                    Err(error) => self.reject(player_id, error).await,
                }
            }
            RoomCommand::Reconnect { player_id, reply } => {
                if !self.room.contains_player(player_id) {
                    let _ = reply.send(Err(RoomError::PlayerNotInRoom));
                } else {
                    let _ = reply.send(Ok(()));
                    self.last_seen.insert(player_id, Instant::now());
                    self.apply_presence(player_id, PresenceStatus::Active).await;
                    self.send_current_state(player_id).await;
                }
            }
            RoomCommand::TimerExpired { round } => {
                self.on_timer_expired(round).await;
            }
            RoomCommand::ValidationDeadline { round } => {
                self.on_validation_deadline(round).await;
            }
            RoomCommand::WordResolved {
                player_id,
                round,
                word,
                ruling,
            } => {
                self.on_word_resolved(player_id, round, word, ruling).await;
            }
            RoomCommand::NextTournamentRound => {
                let tournament_running = self
                    .room
                    .tournament
                    .as_ref()
                    .is_some_and(|t| t.is_active());
                if tournament_running && self.room.phase() == SessionPhase::Results {
                    let host = self.room.host_id();
                    if let Err(error) = self.start_round(host).await {
                        warn!(room = %self.room.code, ?error, "tournament auto-advance failed");
                    }
                }
            }
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.summary());
            }
        }
        true
    }

    fn summary(&self) -> RoomSummary {
        RoomSummary {
            code: self.room.code.clone(),
            phase: self.room.phase().name().to_string(),
            round: self.room.round(),
            players: self.room.roster(),
            settings: self.room.settings.clone(),
        }
    }

    // --- round lifecycle ---

    async fn start_round(&mut self, by: PlayerId) -> Result<(), RoomError> {
        self.room.start(by)?;
        self.begin_round().await
    }

    async fn begin_round(&mut self) -> Result<(), RoomError> {
        let grid = self.make_grid()?;
        let snapshot = grid.snapshot();
        let round = self.room.begin_round(grid)?;

        self.pending.clear();
        let duration = Duration::from_secs(self.room.settings.round_seconds as u64);
        self.round_deadline = Some(Instant::now() + duration);

        self.publish(ServerEvent::RoundStarted {
            round,
            grid: snapshot,
            ends_in_ms: duration.as_millis() as u64,
        })
        .await;

        let tx = self.self_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = tx.send(RoomCommand::TimerExpired { round });
        });
        Ok(())
    }

    fn make_grid(&self) -> Result<Grid, RoomError> {
        let mut rng = rand::thread_rng();
        Grid::generate_for(
            self.room.settings.language,
            self.room.settings.difficulty,
            &mut rng,
        )
        .map_err(|e| RoomError::InvalidPayload {
            detail: e.to_string(),
        })
    }

    async fn on_timer_expired(&mut self, round: u32) {
        if round != self.room.round() || self.room.phase() != SessionPhase::Playing {
            return;
        }
        if self.room.expire_timer().is_err() {
            return;
        }
        self.round_deadline = None;
        self.publish(ServerEvent::ValidatingStarted { round }).await;

        // Validating stays open for the full grace window even with
        // nothing pending, so submissions in flight over the network at
        // the deadline still land instead of bouncing off Results.
        let grace = self.config.validating_grace();
        let tx = self.self_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let _ = tx.send(RoomCommand::ValidationDeadline { round });
        });
    }

    /// Grace elapsed: whatever has not come back from arbitration is
    /// rejected and the round settles.
    async fn on_validation_deadline(&mut self, round: u32) {
        if round != self.room.round() || self.room.phase() != SessionPhase::Validating {
            return;
        }
        let stale: Vec<(PlayerId, String)> = self.pending.drain().collect();
        for (player_id, word) in stale {
            match self.room.resolve(
                player_id,
                &word,
                false,
                Some(RejectReason::ArbitrationUnavailable),
                Instant::now(),
            ) {
                Ok(outcome) => self.broadcast_word_result(player_id, outcome).await,
                Err(error) => {
                    warn!(room = %self.room.code, ?error, word, "stale pending word")
                }
            }
        }
        self.finalize_round().await;
    }

    fn spawn_arbitration(&mut self, player_id: PlayerId, normalized: String) {
        self.pending.insert((player_id, normalized.clone()));
        let round = self.room.round();
        let language = self.room.settings.language;
        let pipeline = self.arbitration.clone();
        let tx = self.self_tx.clone();
        tokio::spawn(async move {
            let ruling = pipeline.arbitrate(&normalized, language).await;
            let _ = tx.send(RoomCommand::WordResolved {
                player_id,
                round,
                word: normalized,
                ruling,
            });
        });
    }

    async fn on_word_resolved(
        &mut self,
        player_id: PlayerId,
        round: u32,
        word: String,
        ruling: Ruling,
    ) {
        if round != self.room.round() {
            return;
        }
        // Already defaulted at the validation deadline.
        if !self.pending.remove(&(player_id, word.clone())) {
            return;
        }
        if !self.room.accepts_submissions() {
            return;
        }

        match self
            .room
            .resolve(player_id, &word, ruling.valid, ruling.reject, Instant::now())
        {
            Ok(outcome) => self.broadcast_word_result(player_id, outcome).await,
            Err(error) => warn!(room = %self.room.code, ?error, word, "resolve failed"),
        }
    }

    async fn finalize_round(&mut self) {
        let round = self.room.round();
        let tournament_was_active = self
            .room
            .tournament
            .as_ref()
            .is_some_and(|t| t.is_active());

        let results = match self.room.finalize_round() {
            Ok(results) => results,
            Err(error) => {
                warn!(room = %self.room.code, ?error, "finalize failed");
                return;
            }
        };

        self.publish(ServerEvent::RoundResults { round, results })
            .await;
        self.broadcast_roster().await;

        if !tournament_was_active {
            return;
        }
        let Some(tournament) = self.room.tournament.as_ref() else {
            return;
        };

        self.publish(ServerEvent::TournamentStandings {
            current_round: tournament.current_round(),
            total_rounds: tournament.total_rounds(),
            standings: tournament.standings(),
            complete: tournament.is_complete(),
        })
        .await;

        if tournament.is_complete() {
            let _ = self.room.return_to_lobby();
        } else if tournament.is_active() {
            let pause = Duration::from_secs(self.config.tournament_intermission_seconds);
            let tx = self.self_tx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(pause).await;
                let _ = tx.send(RoomCommand::NextTournamentRound);
            });
        }
    }

    // --- presence ---

    /// Any deliberate action proves liveness: refresh the clock and lift
    /// the player back to active if a sweep had demoted them.
    async fn touch(&mut self, player_id: PlayerId) {
        self.last_seen.insert(player_id, Instant::now());
        if let Some(current) = self.room.presence_of(player_id) {
            if current != PresenceStatus::Active {
                self.apply_presence(player_id, PresenceStatus::Active).await;
            }
        }
    }

    /// Heartbeats are automatic and carry no intent, so they only lift
    /// the automatic idle demotion. A player who marked themselves afk
    /// stays afk until they act or say otherwise.
    async fn heartbeat_seen(&mut self, player_id: PlayerId) {
        self.last_seen.insert(player_id, Instant::now());
        if self.room.presence_of(player_id) == Some(PresenceStatus::Idle) {
            self.apply_presence(player_id, PresenceStatus::Active).await;
        }
    }

    async fn apply_presence(&mut self, player_id: PlayerId, status: PresenceStatus) {
        let Ok((username, changed)) = self.room.set_presence(player_id, status) else {
            return;
        };
        if !changed {
            return;
        }

        if status == PresenceStatus::Active {
            self.last_seen.insert(player_id, Instant::now());
        }

        self.publish(ServerEvent::PresenceChanged { username, status })
            .await;

        if status == PresenceStatus::Disconnected && self.room.is_host(player_id) {
            if let Some(username) = self.room.reassign_host() {
                self.publish(ServerEvent::HostChanged { username }).await;
                self.broadcast_roster().await;
            }
        }

        if self.room.all_disconnected() {
            self.all_disconnected_since.get_or_insert(Instant::now());
        } else {
            self.all_disconnected_since = None;
        }
    }

    /// Returns false when the empty-room teardown deadline has passed.
    async fn sweep_presence(&mut self) -> bool {
        let now = Instant::now();

        let demotions: Vec<(PlayerId, PresenceStatus)> = self
            .room
            .roster()
            .iter()
            .filter_map(|player| {
                let seen = self.last_seen.get(&player.id)?;
                let next = self.policy.demoted(player.presence, now.duration_since(*seen))?;
                Some((player.id, next))
            })
            .collect();

        for (player_id, status) in demotions {
            self.apply_presence(player_id, status).await;
        }

        if let Some(since) = self.all_disconnected_since {
            let teardown = Duration::from_secs(self.config.room_teardown_seconds);
            if now.duration_since(since) >= teardown {
                self.close_reason = "all players disconnected".to_string();
                return false;
            }
        }
        true
    }

    // --- delivery helpers ---

    async fn send_current_state(&self, player_id: PlayerId) {
        let _ = self
            .connections
            .send_to_player(
                player_id,
                ServerEvent::RosterUpdated {
                    players: self.room.roster(),
                },
            )
            .await;

        if matches!(
            self.room.phase(),
            SessionPhase::Playing | SessionPhase::Validating
        ) {
            if let Some(grid) = self.room.grid() {
                let remaining = self
                    .round_deadline
                    .map(|deadline| {
                        deadline
                            .saturating_duration_since(Instant::now())
                            .as_millis() as u64
                    })
                    .unwrap_or(0);
                let _ = self
                    .connections
                    .send_to_player(
                        player_id,
                        ServerEvent::RoundStarted {
                            round: self.room.round(),
                            grid: grid.snapshot(),
                            ends_in_ms: remaining,
                        },
                    )
                    .await;
            }
        }
    }

    async fn broadcast_word_result(&self, player_id: PlayerId, outcome: SubmitOutcome) {
        let Some(username) = self.room.username_of(player_id) else {
            return;
        };
        self.publish(ServerEvent::WordResult {
            username: username.to_string(),
            outcome,
        })
        .await;
    }

    async fn broadcast_roster(&self) {
        self.publish(ServerEvent::RosterUpdated {
            players: self.room.roster(),
        })
        .await;
    }

    async fn publish(&self, event: ServerEvent) {
        self.bus.publish(&self.room.code, event).await;
    }

    async fn reject(&self, player_id: PlayerId, error: RoomError) {
        let _ = self
            .connections
            .send_to_player(player_id, ServerEvent::ActionRejected { error })
            .await;
    }
}

/// Pick an unambiguous shareable room code.
pub fn random_room_code(rng: &mut impl Rng) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
    const LEN: usize = 5;
    (0..LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}
