//! Match session management for Deathrope.
//!
//! A [`MatchSession`] is the explicit context object for one match. It owns
//! the team ledger, the round state, and the active game mode, and it is the
//! only thing that talks to the outside world:
//!
//! 1. **Authority**: only a [`Role::Server`] session may mutate the match.
//!    Client sessions replay [`Envelope`](deathrope_protocol::Envelope)s.
//! 2. **Effects**: round controller output (broadcasts, log lines,
//!    teardown) is carried out here.
//! 3. **Network**: everything leaving the core goes through the
//!    [`MatchNetwork`] trait.
//!
//! # How it fits in the stack
//!
//! ```text
//! Match server (above)  ← drives ticks, forwards gameplay events
//!     ↕
//! Session layer (this crate)  ← authority, replication, match log
//!     ↕
//! Match layer (below)  ← ledger, round controller, game modes
//! ```

mod error;
mod log;
mod network;
mod session;

pub use error::SessionError;
pub use log::MatchLog;
pub use network::{ChannelNetwork, MatchNetwork, NetworkEvent};
pub use session::{DEFAULT_FIRST_TEAM_LAYER, MatchSession, Role};
