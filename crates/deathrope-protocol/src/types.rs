//! Replicated types: everything a client is told about the match.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Index of a team within the match, starting at 0.
///
/// Serialized as a plain number. The team's display name is derived from
/// it (`"Team 0"`, `"Team 1"`, ...) but scoring never looks at names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub u32);

impl TeamId {
    /// Slot index of this team in per-team arrays.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T-{}", self.0)
    }
}

/// Index of a player within the match. Two players per team, so player
/// `n` belongs to team `n / 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl PlayerId {
    /// The team this player slot belongs to, or `None` if the slot is
    /// beyond any representable team.
    pub fn team(self) -> Option<TeamId> {
        u32::try_from(self.0 / 2).ok().map(TeamId)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who should receive a replicated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every connected participant.
    All,
    /// One specific player.
    Player(PlayerId),
    /// Everyone except the given player.
    AllExcept(PlayerId),
}

// ---------------------------------------------------------------------------
// Spatial / cosmetic data attached to teams
// ---------------------------------------------------------------------------

/// A spawn location in level space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// 8-bit RGB team color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Identity of a spawned team, broadcast so clients can build the team
/// entity locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub id: TeamId,
    pub name: String,
    /// Physics/render layer assigned to the team's players.
    pub layer: u32,
    /// Primary and secondary player colors.
    pub colors: [Color; 2],
    /// Spawn point for player 1 and player 2 of the team.
    pub spawn_points: [Position; 2],
}

/// One line of the scoreboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamScore {
    pub team: TeamId,
    pub name: String,
    pub score: u32,
}

// ---------------------------------------------------------------------------
// RoundPhase
// ---------------------------------------------------------------------------

/// Where the match is in its round lifecycle.
///
/// ```text
/// Lobby → Warmup → RoundActive → RoundEnding ─┬→ Warmup (next round)
///                                             └→ MatchComplete
/// ```
///
/// - **Lobby**: teams are being set up, no round has begun.
/// - **Warmup**: the 3..2..1 countdown before a round; the round timer is
///   frozen.
/// - **RoundActive**: players fight; the round timer runs.
/// - **RoundEnding**: a team was eliminated (or time ran out); scores were
///   awarded and the cooldown before the next round is running.
/// - **MatchComplete**: the round limit was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoundPhase {
    #[default]
    Lobby,
    Warmup,
    RoundActive,
    RoundEnding,
    MatchComplete,
}

impl RoundPhase {
    /// Returns `true` once the match can no longer change.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::MatchComplete)
    }
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::Warmup => write!(f, "Warmup"),
            Self::RoundActive => write!(f, "RoundActive"),
            Self::RoundEnding => write!(f, "RoundEnding"),
            Self::MatchComplete => write!(f, "MatchComplete"),
        }
    }
}

// ---------------------------------------------------------------------------
// MatchSnapshot
// ---------------------------------------------------------------------------

/// Read-only projection of the authoritative match state.
///
/// Clients render from this and nothing else: the scoreboard, the round
/// counter, and the countdown / round clock.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub phase: RoundPhase,
    pub current_round: u32,
    pub round_limit: u32,
    pub match_started: bool,
    pub match_active: bool,
    pub countdown_over: bool,
    /// Seconds left in the pre-round countdown.
    pub countdown_timer: f32,
    /// Seconds left on the round clock.
    pub time_remaining: f32,
    pub next_round_pending: bool,
    pub scores: Vec<TeamScore>,
}

impl MatchSnapshot {
    /// Checks the invariants a well-formed snapshot must satisfy before a
    /// client adopts it.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.current_round > self.round_limit {
            return Err(ProtocolError::InvalidMessage(format!(
                "round {} exceeds round limit {}",
                self.current_round, self.round_limit
            )));
        }
        if self.countdown_timer < 0.0 || self.time_remaining < 0.0 {
            return Err(ProtocolError::InvalidMessage(
                "negative timer in snapshot".into(),
            ));
        }
        Ok(())
    }

    /// Score of the given team, if it is on the scoreboard.
    pub fn score_of(&self, team: TeamId) -> Option<u32> {
        self.scores.iter().find(|s| s.team == team).map(|s| s.score)
    }
}

// ---------------------------------------------------------------------------
// MatchMessage
// ---------------------------------------------------------------------------

/// Messages the authoritative server sends to participants.
///
/// Internally tagged, so `RoundStarted { round: 1 }` becomes
/// `{ "type": "RoundStarted", "round": 1 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MatchMessage {
    /// A match has begun on `level`.
    StartGame { level: String, round_limit: u32 },

    /// A team entity was created on the server.
    TeamSpawned { team: TeamInfo },

    /// A round's countdown has started.
    RoundStarted { round: u32 },

    /// Scores changed.
    ScoreUpdate { scores: Vec<TeamScore> },

    /// The round counter moved forward.
    RoundAdvanced { round: u32, round_limit: u32 },

    /// The round limit was reached. Clients should leave the match.
    MatchEnded { scores: Vec<TeamScore> },

    /// Full replicated state, sent after every state-changing event.
    Snapshot(MatchSnapshot),
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Wrapper around every replicated message.
///
/// `seq` increases by one for every envelope the server emits. Clients use
/// it to discard snapshots that arrive after a newer one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub seq: u64,
    /// Simulation tick at which the server produced the message.
    pub tick: u64,
    pub payload: MatchMessage,
}
