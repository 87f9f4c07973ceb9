//! The match session: explicit context for one match.

use deathrope_match::{
    GameMode, GameModeKind, Ledger, MatchConfig, MatchContext, MatchEffect, MatchError,
    PLAYERS_PER_TEAM, RoundController, RoundState, Team, team_colors,
};
use deathrope_protocol::{
    Codec, Envelope, JsonCodec, MatchMessage, MatchSnapshot, PlayerId, Position, Recipient,
    RoundPhase, TeamId, TeamInfo,
};

use crate::{MatchLog, MatchNetwork, SessionError};

/// Physics layer of team 0. Team `n` gets `first_team_layer + n`.
pub const DEFAULT_FIRST_TEAM_LAYER: u32 = 8;

/// Ticks between unconditional snapshot broadcasts.
const DEFAULT_SNAPSHOT_INTERVAL: u64 = 30;

/// Which side of the replication boundary a session is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Owns the match. The only role allowed to change it.
    Server,
    /// Mirrors the server through replicated envelopes.
    Client,
}

/// Everything about one match: teams, spawn points, round state, the active
/// game mode, and the collaborators used to replicate and record it.
///
/// There is no global instance. Whoever runs the match builds a session and
/// passes it where it is needed.
///
/// ## Server lifecycle
///
/// ```text
/// set_number_of_players() ──→ set_spawn() × n ──→ start_game()
///                                                    │
///                      tick() / kill_team() ◄────────┘
///                                │
///                                ▼ (round limit reached or force_stop)
///                            teardown (once)
/// ```
pub struct MatchSession<N: MatchNetwork> {
    role: Role,
    config: MatchConfig,
    ledger: Ledger,
    state: RoundState,
    mode: GameMode,

    /// Two per team, indexed `team * 2 + slot`.
    spawn_points: Vec<Position>,
    first_team_layer: u32,
    level: Option<String>,

    network: N,
    log: MatchLog,

    /// Sequence number of the last envelope sent (server) or applied (client).
    seq: u64,
    tick: u64,
    snapshot_interval: u64,
    torn_down: bool,

    // Client-side mirror.
    replica: MatchSnapshot,
    replica_teams: Vec<TeamInfo>,
    client_stopped: bool,
}

impl<N: MatchNetwork> MatchSession<N> {
    pub fn new(role: Role, config: MatchConfig, network: N, log: MatchLog) -> Self {
        let config = config.validated();
        let state = RoundState::new(&config);
        let replica = MatchSnapshot {
            round_limit: config.round_limit,
            ..MatchSnapshot::default()
        };

        tracing::info!(
            ?role,
            round_limit = config.round_limit,
            log = %log.path().display(),
            "match session created"
        );

        Self {
            role,
            config,
            ledger: Ledger::default(),
            state,
            mode: GameMode::default(),
            spawn_points: Vec::new(),
            first_team_layer: DEFAULT_FIRST_TEAM_LAYER,
            level: None,
            network,
            log,
            seq: 0,
            tick: 0,
            snapshot_interval: DEFAULT_SNAPSHOT_INTERVAL,
            torn_down: false,
            replica,
            replica_teams: Vec::new(),
            client_stopped: false,
        }
    }

    pub fn with_first_team_layer(mut self, layer: u32) -> Self {
        self.first_team_layer = layer;
        self
    }

    /// Sets how often (in ticks) a snapshot goes out even if nothing
    /// changed. Clamped to at least 1.
    pub fn with_snapshot_interval(mut self, ticks: u64) -> Self {
        self.snapshot_interval = ticks.max(1);
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn game_mode(&self) -> GameModeKind {
        self.mode.kind()
    }

    /// The level being played, once `start_game` ran (or was replicated).
    pub fn level(&self) -> Option<&str> {
        self.level.as_deref()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Teams a client has learned about through replication.
    pub fn replicated_teams(&self) -> &[TeamInfo] {
        &self.replica_teams
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut N {
        &mut self.network
    }

    // -----------------------------------------------------------------------
    // Setup (server)
    // -----------------------------------------------------------------------

    /// Allocates `teams` team slots and two spawn points per team.
    ///
    /// Clears any previously spawned teams.
    pub fn set_number_of_players(&mut self, teams: usize) -> Result<(), SessionError> {
        self.require_server("set_number_of_players")?;
        self.ledger = Ledger::with_slots(teams);
        self.spawn_points = vec![Position::default(); teams * PLAYERS_PER_TEAM];
        self.state.active_players = 0;
        tracing::info!(teams, "team slots allocated");
        Ok(())
    }

    /// Assigns both spawn points of `team`, then spawns it.
    ///
    /// # Errors
    /// [`MatchError::TeamSlotOutOfRange`] if the team has no slot.
    pub fn set_spawn(
        &mut self,
        team: TeamId,
        first: Position,
        second: Position,
    ) -> Result<(), SessionError> {
        self.require_server("set_spawn")?;
        let base = team.index() * PLAYERS_PER_TEAM;
        if base + 1 >= self.spawn_points.len() {
            return Err(self.out_of_range(team));
        }
        self.spawn_points[base] = first;
        self.spawn_points[base + 1] = second;
        self.spawn_team(team)
    }

    /// Creates the team record for `team`, stores it in the ledger, and
    /// asks the network to spawn it and its ready players.
    ///
    /// Spawning a team again keeps its score.
    pub fn spawn_team(&mut self, team: TeamId) -> Result<(), SessionError> {
        self.require_server("spawn_team")?;
        if self.state.phase.is_terminal() {
            return Err(MatchError::InvalidState("cannot spawn teams after the match".into()).into());
        }

        let base = team.index() * PLAYERS_PER_TEAM;
        let spawns = match self.spawn_points.get(base..base + PLAYERS_PER_TEAM) {
            Some(&[first, second]) => [first, second],
            _ => return Err(self.out_of_range(team)),
        };

        let mut record = Team::new(
            team,
            spawns,
            team_colors(team.index()),
            self.first_team_layer + team.0,
        );
        if let Some(existing) = self.ledger.get(team) {
            record.score = existing.score;
        }
        let info = record.info();

        tracing::info!(%team, layer = info.layer, "spawning team");
        if self.ledger.insert(record)?.is_none() {
            self.state.active_players += PLAYERS_PER_TEAM;
        }

        self.network.spawn_team(&info)?;
        self.network.spawn_ready_players(team)?;
        self.broadcast(Recipient::All, MatchMessage::TeamSpawned { team: info })
    }

    /// Where the player at `player` should (re)spawn.
    ///
    /// Player `n` belongs to team `n / 2` and uses that team's spawn point
    /// `n % 2`.
    pub fn spawn_player(&self, player: PlayerId) -> Result<Position, SessionError> {
        self.require_server("spawn_player")?;
        let team = player.team().ok_or(MatchError::UnknownPlayer(player))?;
        let record = self.ledger.get(team).ok_or(MatchError::UnknownTeam(team))?;
        Ok(record.spawn_points[(player.0 % PLAYERS_PER_TEAM as u64) as usize])
    }

    /// Replaces the active game mode. Scores and round state are kept.
    pub fn set_game_mode(&mut self, kind: GameModeKind) -> Result<(), SessionError> {
        self.require_server("set_game_mode")?;
        tracing::info!(from = %self.mode.kind(), to = %kind, "switching game mode");
        self.mode = GameMode::new(kind);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Match flow (server)
    // -----------------------------------------------------------------------

    /// Starts the first round and moves everyone to `level`.
    ///
    /// # Errors
    /// [`MatchError::InvalidState`] once the match is over or torn down.
    pub fn start_game(&mut self, level: &str) -> Result<(), SessionError> {
        self.require_server("start_game")?;
        if self.torn_down || self.state.phase.is_terminal() {
            return Err(MatchError::InvalidState("cannot start a game after the match".into()).into());
        }
        self.level = Some(level.to_string());
        let before = self.state.phase;

        let effects = self.run(|mode, ctx| mode.begin_round(ctx));
        self.network.change_scene(level)?;
        self.broadcast(
            Recipient::All,
            MatchMessage::StartGame {
                level: level.to_string(),
                round_limit: self.config.round_limit,
            },
        )?;
        self.record(&format!(
            "Starting new game, level: {level} out of {} rounds",
            self.config.round_limit
        ));

        self.finish(effects, before)
    }

    /// A team was wiped out, or `None` to force the round to end.
    pub fn kill_team(&mut self, team: Option<TeamId>) -> Result<(), SessionError> {
        self.require_server("kill_team")?;
        let before = self.state.phase;
        let effects = self.run(|mode, ctx| mode.kill_team(ctx, team));
        self.finish(effects, before)
    }

    /// Gives `team` one point outside the normal round flow and replicates
    /// the scoreboard. Returns the new score.
    pub fn add_score(&mut self, team: TeamId) -> Result<u32, SessionError> {
        self.require_server("add_score")?;
        let score = self.run(|mode, ctx| mode.add_score(ctx, team))?;
        self.broadcast(
            Recipient::All,
            MatchMessage::ScoreUpdate {
                scores: self.ledger.scores(),
            },
        )?;
        Ok(score)
    }

    /// Advances the simulation by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> Result<(), SessionError> {
        self.require_server("tick")?;
        self.tick += 1;
        let before = self.state.phase;
        let effects = self.run(|mode, ctx| mode.on_tick(ctx, dt));
        tracing::trace!(tick = self.tick, phase = %self.state.phase, "tick");
        self.finish(effects, before)
    }

    /// Ends the match immediately and tears the session down.
    pub fn force_stop(&mut self, reason: &str) -> Result<(), SessionError> {
        self.require_server("force_stop")?;
        if self.torn_down {
            tracing::debug!(reason, "session already torn down");
            return Ok(());
        }

        tracing::warn!(reason, "match force-stopped");
        self.state.match_active = false;
        self.state.active_players = 0;
        self.state.phase = RoundPhase::MatchComplete;
        self.record(&format!("Match stopped: {reason}"));
        self.broadcast(
            Recipient::All,
            MatchMessage::MatchEnded {
                scores: self.ledger.scores(),
            },
        )?;
        let offline_scene = self.config.offline_scene.clone();
        self.teardown(&offline_scene)
    }

    /// Appends a line to the match log.
    pub fn write_to_log(&self, line: &str) -> Result<(), SessionError> {
        self.log.append(line)
    }

    /// The replicated view of the match.
    ///
    /// On the server this is built from the live state; on a client it is
    /// whatever replication has delivered so far.
    pub fn snapshot(&self) -> MatchSnapshot {
        match self.role {
            Role::Server => self.state.snapshot(&self.ledger),
            Role::Client => self.replica.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Replication (client)
    // -----------------------------------------------------------------------

    /// Applies one replicated envelope to the client mirror.
    ///
    /// Returns `false` if the envelope was stale (sequence number not newer
    /// than the last applied one) and was dropped.
    pub fn apply(&mut self, envelope: Envelope) -> Result<bool, SessionError> {
        self.require_client("apply")?;
        if self.seq > 0 && envelope.seq <= self.seq {
            tracing::debug!(seq = envelope.seq, last = self.seq, "dropping stale envelope");
            return Ok(false);
        }

        if let MatchMessage::Snapshot(snapshot) = &envelope.payload {
            snapshot.validate()?;
        }
        self.seq = envelope.seq;
        self.tick = envelope.tick;

        let replica = &mut self.replica;
        match envelope.payload {
            MatchMessage::StartGame { level, round_limit } => {
                tracing::info!(%level, round_limit, "server started the game");
                self.level = Some(level);
                replica.round_limit = round_limit;
                replica.match_started = true;
                replica.phase = RoundPhase::Warmup;
            }
            MatchMessage::TeamSpawned { team } => {
                match self.replica_teams.iter_mut().find(|t| t.id == team.id) {
                    Some(existing) => *existing = team,
                    None => self.replica_teams.push(team),
                }
            }
            MatchMessage::RoundStarted { round } => {
                replica.current_round = round;
                replica.phase = RoundPhase::Warmup;
                replica.match_started = true;
                replica.match_active = true;
                replica.countdown_over = false;
                replica.next_round_pending = false;
            }
            MatchMessage::ScoreUpdate { scores } => replica.scores = scores,
            MatchMessage::RoundAdvanced { round, round_limit } => {
                replica.current_round = round;
                replica.round_limit = round_limit;
                replica.next_round_pending = true;
            }
            MatchMessage::MatchEnded { scores } => {
                replica.scores = scores;
                replica.phase = RoundPhase::MatchComplete;
                replica.match_active = false;
            }
            MatchMessage::Snapshot(snapshot) => *replica = snapshot,
        }
        Ok(true)
    }

    /// Decodes a frame produced by the server's network and applies it.
    pub fn apply_frame(&mut self, frame: &[u8]) -> Result<bool, SessionError> {
        let envelope: Envelope = JsonCodec.decode(frame)?;
        self.apply(envelope)
    }

    /// Leaves the match. Only the first call reaches the network.
    pub fn disconnect(&mut self) -> Result<(), SessionError> {
        self.require_client("disconnect")?;
        if self.client_stopped {
            tracing::debug!("client already stopped");
            return Ok(());
        }
        self.client_stopped = true;
        tracing::info!("stopping client");
        self.network.stop_client()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn require_server(&self, operation: &'static str) -> Result<(), SessionError> {
        match self.role {
            Role::Server => Ok(()),
            Role::Client => Err(SessionError::NotAuthoritative { operation }),
        }
    }

    fn require_client(&self, operation: &'static str) -> Result<(), SessionError> {
        match self.role {
            Role::Client => Ok(()),
            Role::Server => Err(SessionError::ClientOnly { operation }),
        }
    }

    fn out_of_range(&self, team: TeamId) -> SessionError {
        MatchError::TeamSlotOutOfRange {
            team,
            slots: self.ledger.slot_count(),
        }
        .into()
    }

    /// Lends the active mode a context over this session's match state.
    fn run<R>(&mut self, f: impl FnOnce(&mut GameMode, &mut MatchContext<'_>) -> R) -> R {
        let mut ctx = MatchContext {
            config: &self.config,
            ledger: &mut self.ledger,
            state: &mut self.state,
        };
        f(&mut self.mode, &mut ctx)
    }

    /// Carries out controller effects, then replicates a snapshot if
    /// anything changed or the periodic interval came up.
    fn finish(&mut self, effects: Vec<MatchEffect>, before: RoundPhase) -> Result<(), SessionError> {
        let changed = !effects.is_empty() || self.state.phase != before;
        for effect in effects {
            match effect {
                MatchEffect::Broadcast(recipient, message) => self.broadcast(recipient, message)?,
                MatchEffect::Log(line) => self.record(&line),
                MatchEffect::Teardown { offline_scene } => self.teardown(&offline_scene)?,
            }
        }

        if !self.torn_down && (changed || self.tick % self.snapshot_interval == 0) {
            self.send_snapshot()?;
        }
        Ok(())
    }

    fn broadcast(&mut self, recipient: Recipient, payload: MatchMessage) -> Result<(), SessionError> {
        self.seq += 1;
        let envelope = Envelope {
            seq: self.seq,
            tick: self.tick,
            payload,
        };
        self.network.send(recipient, &envelope)
    }

    fn send_snapshot(&mut self) -> Result<(), SessionError> {
        let snapshot = self.state.snapshot(&self.ledger);
        self.broadcast(Recipient::All, MatchMessage::Snapshot(snapshot))
    }

    /// Log failures never stop the match.
    fn record(&self, line: &str) {
        if let Err(e) = self.log.append(line) {
            tracing::warn!(error = %e, "match log write failed");
        }
    }

    /// Stops the server and sends everyone to `offline_scene`. At most once.
    fn teardown(&mut self, offline_scene: &str) -> Result<(), SessionError> {
        if self.torn_down {
            tracing::debug!("teardown already done, ignoring");
            return Ok(());
        }
        self.torn_down = true;
        tracing::info!(offline_scene, "tearing down match session");
        self.send_snapshot()?;
        self.network.stop_server(offline_scene)
    }
}
