//! Game modes.
//!
//! The set of modes is closed: [`GameMode`] is an enum, and switching modes
//! means replacing the value, never constructing a mode from a runtime
//! type name.

use std::fmt;

use deathrope_protocol::{RoundPhase, TeamId};
use serde::{Deserialize, Serialize};

use crate::controller::{accepts_round_end, award_all_except, finish_round};
use crate::{MatchContext, MatchEffect, MatchError, RoundController};

// ---------------------------------------------------------------------------
// Deathmatch
// ---------------------------------------------------------------------------

/// Free-for-all elimination.
///
/// The first team wiped out in a round ends it, and every other team
/// scores a point. Further eliminations in the same round are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deathmatch;

impl RoundController for Deathmatch {
    fn kill_team(&mut self, ctx: &mut MatchContext<'_>, team: Option<TeamId>) -> Vec<MatchEffect> {
        if !accepts_round_end(ctx.state, team) {
            return Vec::new();
        }

        let mut effects = match team {
            Some(eliminated) => award_all_except(self, ctx, eliminated, |name, secs| {
                format!("{name} won the round with {secs:.1} seconds remaining")
            }),
            None => {
                tracing::info!(round = ctx.state.current_round, "round ended with no score");
                Vec::new()
            }
        };

        finish_round(ctx, &mut effects);
        effects
    }
}

// ---------------------------------------------------------------------------
// Soccer
// ---------------------------------------------------------------------------

/// Timed rounds where an "elimination" is a goal.
///
/// `kill_team(Some(team))` means `team` conceded: every other team scores
/// and play continues. The round only ends when the clock runs out (or on
/// a forced `kill_team(None)`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Soccer;

impl RoundController for Soccer {
    fn kill_team(&mut self, ctx: &mut MatchContext<'_>, team: Option<TeamId>) -> Vec<MatchEffect> {
        let Some(conceded) = team else {
            if !accepts_round_end(ctx.state, None) {
                return Vec::new();
            }
            let mut effects = Vec::new();
            finish_round(ctx, &mut effects);
            return effects;
        };

        if ctx.state.phase != RoundPhase::RoundActive {
            tracing::debug!(team = %conceded, phase = %ctx.state.phase, "goal outside live play, ignoring");
            return Vec::new();
        }

        let effects = award_all_except(self, ctx, conceded, |name, secs| {
            format!("{name} scored with {secs:.1} seconds remaining")
        });

        // Play resumes immediately after a goal.
        ctx.ledger.revive_all();
        ctx.state.match_active = true;
        effects
    }
}

// ---------------------------------------------------------------------------
// GameMode
// ---------------------------------------------------------------------------

/// Names the available modes, for configuration and replication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameModeKind {
    #[default]
    Deathmatch,
    Soccer,
}

impl fmt::Display for GameModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deathmatch => write!(f, "Deathmatch"),
            Self::Soccer => write!(f, "Soccer"),
        }
    }
}

/// The active game mode. Exactly one is active per session.
#[derive(Debug, Clone, Copy)]
pub enum GameMode {
    Deathmatch(Deathmatch),
    Soccer(Soccer),
}

impl GameMode {
    pub fn new(kind: GameModeKind) -> Self {
        match kind {
            GameModeKind::Deathmatch => Self::Deathmatch(Deathmatch),
            GameModeKind::Soccer => Self::Soccer(Soccer),
        }
    }

    pub fn kind(&self) -> GameModeKind {
        match self {
            Self::Deathmatch(_) => GameModeKind::Deathmatch,
            Self::Soccer(_) => GameModeKind::Soccer,
        }
    }

    fn as_controller(&mut self) -> &mut dyn RoundController {
        match self {
            Self::Deathmatch(mode) => mode,
            Self::Soccer(mode) => mode,
        }
    }
}

impl Default for GameMode {
    fn default() -> Self {
        Self::new(GameModeKind::default())
    }
}

impl RoundController for GameMode {
    fn kill_team(&mut self, ctx: &mut MatchContext<'_>, team: Option<TeamId>) -> Vec<MatchEffect> {
        self.as_controller().kill_team(ctx, team)
    }

    fn add_score(&mut self, ctx: &mut MatchContext<'_>, team: TeamId) -> Result<u32, MatchError> {
        self.as_controller().add_score(ctx, team)
    }

    fn begin_round(&mut self, ctx: &mut MatchContext<'_>) -> Vec<MatchEffect> {
        self.as_controller().begin_round(ctx)
    }

    fn on_tick(&mut self, ctx: &mut MatchContext<'_>, dt: f32) -> Vec<MatchEffect> {
        self.as_controller().on_tick(ctx, dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_is_deathmatch() {
        assert_eq!(GameMode::default().kind(), GameModeKind::Deathmatch);
    }

    #[test]
    fn test_new_matches_kind() {
        assert_eq!(GameMode::new(GameModeKind::Soccer).kind(), GameModeKind::Soccer);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(GameModeKind::Soccer.to_string(), "Soccer");
    }
}
