//! Round and match lifecycle for Deathrope.
//!
//! A match is a fixed number of rounds. Each round starts with a
//! countdown, runs until a team is wiped out (or the clock runs out), then
//! pauses for a short cooldown before the next one. When the round limit
//! is reached the match ends and the session is torn down.
//!
//! Nothing here does I/O. Every operation mutates the [`Ledger`] and
//! [`RoundState`] handed to it through a [`MatchContext`] and returns
//! [`MatchEffect`]s (broadcasts, log lines, teardown) for the session layer
//! to carry out.
//!
//! # Key types
//!
//! - [`RoundController`]: the capability set every game mode implements
//! - [`GameMode`]: closed set of modes ([`Deathmatch`], [`Soccer`])
//! - [`Ledger`] / [`Team`]: per-team score and alive status
//! - [`RoundState`]: round counter, timers, and match flags
//! - [`MatchConfig`]: round limit and timer durations

mod config;
mod controller;
mod effect;
mod error;
mod ledger;
mod mode;
mod state;

pub use config::MatchConfig;
pub use controller::{MatchContext, RoundController};
pub use effect::MatchEffect;
pub use error::MatchError;
pub use ledger::{Ledger, PLAYERS_PER_TEAM, Team, team_colors};
pub use mode::{Deathmatch, GameMode, GameModeKind, Soccer};
pub use state::RoundState;
