//! Replication protocol for Deathrope matches.
//!
//! The server is the only process allowed to change match state. Everything
//! a client knows about the match (scores, round counter, countdown) arrives
//! as messages defined here:
//!
//! - **Types** ([`Envelope`], [`MatchMessage`], [`MatchSnapshot`], ids):
//!   the structures that travel to clients.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages are
//!   turned into bytes for whatever transport the game uses.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Round controller (effects) → Session (Envelope) → Codec (bytes) → network
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Color, Envelope, MatchMessage, MatchSnapshot, PlayerId, Position,
    Recipient, RoundPhase, TeamId, TeamInfo, TeamScore,
};
