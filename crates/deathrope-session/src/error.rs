//! Error types for the session layer.

use std::path::PathBuf;

use deathrope_match::MatchError;
use deathrope_protocol::ProtocolError;

/// Errors that can occur while running a match session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A client session tried to change authoritative match state.
    #[error("{operation} requires the server role")]
    NotAuthoritative { operation: &'static str },

    /// A server session was asked to do something only clients do,
    /// such as replaying a replicated envelope.
    #[error("{operation} requires the client role")]
    ClientOnly { operation: &'static str },

    /// The ledger or round controller rejected the operation.
    #[error(transparent)]
    Match(#[from] MatchError),

    /// A replicated message could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The match log could not be written.
    #[error("failed to write match log {path}: {source}")]
    Log {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The network collaborator is gone (its receiving side was dropped).
    #[error("network channel closed")]
    NetworkClosed,
}
