//! Unified error type for Deathrope.

use deathrope_ai::AiError;
use deathrope_match::MatchError;
use deathrope_protocol::ProtocolError;
use deathrope_session::SessionError;

use crate::settings::SettingsError;

/// Top-level error that wraps every crate-specific error.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum DeathropeError {
    /// Building a behavior brain or loading a priority table failed.
    #[error(transparent)]
    Ai(#[from] AiError),

    /// The ledger or round controller rejected an operation.
    #[error(transparent)]
    Match(#[from] MatchError),

    /// Authority, replication, network, or match log failure.
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Settings or key-binding file problem.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// The match server task has stopped.
    #[error("match server is not running")]
    ServerUnavailable,
}

#[cfg(test)]
mod tests {
    use deathrope_protocol::TeamId;

    use super::*;

    #[test]
    fn test_from_ai_error() {
        let err: DeathropeError = AiError::DuplicateSource("Idle".into()).into();
        assert!(matches!(err, DeathropeError::Ai(_)));
        assert!(err.to_string().contains("Idle"));
    }

    #[test]
    fn test_from_match_error() {
        let err: DeathropeError = MatchError::UnknownTeam(TeamId(3)).into();
        assert!(matches!(err, DeathropeError::Match(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err: DeathropeError = SessionError::NotAuthoritative { operation: "tick" }.into();
        assert!(matches!(err, DeathropeError::Session(_)));
        assert_eq!(err.to_string(), "tick requires the server role");
    }

    #[test]
    fn test_from_settings_error() {
        let err: DeathropeError = SettingsError::InvalidSlot { slot: 9, max: 4 }.into();
        assert!(matches!(err, DeathropeError::Settings(_)));
    }
}
