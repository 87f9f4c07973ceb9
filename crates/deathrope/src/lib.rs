//! # Deathrope
//!
//! Match-flow core for a team arena game: AI behavior brains, the
//! round/match lifecycle, and a server-authoritative match session.
//!
//! The server runs one [`MatchServer`](server::MatchServer) task per match.
//! Each frame it advances the round timers and polls every AI agent; the
//! game reports eliminations through the [`MatchHandle`](server::MatchHandle).
//! Everything clients see goes out through the session's
//! [`MatchNetwork`](deathrope_session::MatchNetwork).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deathrope::prelude::*;
//!
//! # async fn run() -> Result<(), DeathropeError> {
//! let settings = MatchSettings::load("settings.json".as_ref())?;
//! let (network, _events) = ChannelNetwork::new();
//! let mut session = MatchSession::new(
//!     Role::Server,
//!     settings.match_config.clone(),
//!     network,
//!     MatchLog::open("gamelog.txt")?,
//! );
//! session.set_number_of_players(settings.teams)?;
//! for team in 0..settings.teams as u32 {
//!     session.spawn_team(TeamId(team))?;
//! }
//!
//! let (handle, finished) = MatchServer::spawn(session, settings.tick.clone());
//! handle.start_game(&settings.level).await?;
//! handle.kill_team(Some(TeamId(0))).await?;
//! let _final_snapshot = finished.await;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod controls;
mod error;
pub mod server;
pub mod settings;

pub use error::DeathropeError;

pub mod prelude {
    pub use crate::agent::{Agent, AgentView, standard_brain};
    pub use crate::controls::{ControlInput, Controls, ControlsStore, InputSource};
    pub use crate::server::{MatchHandle, MatchServer};
    pub use crate::settings::{MatchSettings, SettingsError};
    pub use crate::DeathropeError;

    pub use deathrope_ai::{BehaviorKind, BehaviorMachine, Guard, PriorityTable, StateTransitions};
    pub use deathrope_match::{GameModeKind, MatchConfig, PLAYERS_PER_TEAM, RoundController};
    pub use deathrope_protocol::{
        Envelope, MatchMessage, MatchSnapshot, PlayerId, Position, Recipient, RoundPhase, TeamId,
    };
    pub use deathrope_session::{ChannelNetwork, MatchLog, MatchNetwork, MatchSession, NetworkEvent, Role};
    pub use deathrope_tick::TickConfig;
}
