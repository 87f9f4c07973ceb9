//! Error types for the match layer.

use deathrope_protocol::{PlayerId, TeamId};

/// Errors that can occur while mutating the ledger or the round state.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// No team with this id has been spawned.
    #[error("team {0} is not in the ledger")]
    UnknownTeam(TeamId),

    /// The player slot maps to no team this match could have.
    #[error("player {0} does not belong to any team")]
    UnknownPlayer(PlayerId),

    /// The team index is beyond the number of allocated team slots.
    #[error("team {team} out of range, match has {slots} team slots")]
    TeamSlotOutOfRange { team: TeamId, slots: usize },

    /// The operation is not allowed in the current phase,
    /// e.g. spawning teams after the match has finished.
    #[error("invalid match state for this operation: {0}")]
    InvalidState(String),
}
