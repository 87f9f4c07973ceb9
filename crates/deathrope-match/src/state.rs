//! Round and match state.

use deathrope_protocol::{MatchSnapshot, RoundPhase};

use crate::{Ledger, MatchConfig};

/// Authoritative round/match flags and timers.
///
/// Owned by the session and changed only by a [`RoundController`](crate::RoundController)
/// on the server. Clients see it through [`snapshot`](Self::snapshot).
///
/// Invariants:
/// - `current_round <= round_limit`
/// - `next_round_pending` is only set between a round ending and the next
///   round starting (and stays set once the match is complete)
#[derive(Debug, Clone, PartialEq)]
pub struct RoundState {
    pub phase: RoundPhase,
    pub current_round: u32,
    pub round_limit: u32,
    /// Cleared while scores are being awarded and when the match ends.
    pub match_active: bool,
    /// Set by the first `begin_round`.
    pub match_started: bool,
    pub countdown_over: bool,
    pub countdown_timer: f32,
    pub next_round_pending: bool,
    pub time_before_next_round: f32,
    pub time_remaining: f32,
    /// Players currently in the match. Reset to 0 when the match ends.
    pub active_players: usize,
}

impl RoundState {
    /// Fresh state for a match that has not started.
    pub fn new(config: &MatchConfig) -> Self {
        Self {
            phase: RoundPhase::Lobby,
            current_round: 0,
            round_limit: config.round_limit,
            match_active: false,
            match_started: false,
            countdown_over: false,
            countdown_timer: config.countdown_secs,
            next_round_pending: false,
            time_before_next_round: config.time_before_next_round_secs,
            time_remaining: config.time_remaining_secs,
            active_players: 0,
        }
    }

    /// Returns `true` once the round limit has been reached.
    pub fn is_match_over(&self) -> bool {
        self.current_round >= self.round_limit
    }

    /// The replicated projection of this state plus the scoreboard.
    pub fn snapshot(&self, ledger: &Ledger) -> MatchSnapshot {
        MatchSnapshot {
            phase: self.phase,
            current_round: self.current_round,
            round_limit: self.round_limit,
            match_started: self.match_started,
            match_active: self.match_active,
            countdown_over: self.countdown_over,
            countdown_timer: self.countdown_timer,
            time_remaining: self.time_remaining,
            next_round_pending: self.next_round_pending,
            scores: ledger.scores(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_in_lobby_with_config_timers() {
        let config = MatchConfig::with_round_limit(5);
        let state = RoundState::new(&config);
        assert_eq!(state.phase, RoundPhase::Lobby);
        assert_eq!(state.current_round, 0);
        assert_eq!(state.round_limit, 5);
        assert_eq!(state.countdown_timer, config.countdown_secs);
        assert!(!state.next_round_pending);
        assert!(!state.is_match_over());
    }

    #[test]
    fn test_snapshot_copies_flags() {
        let mut state = RoundState::new(&MatchConfig::default());
        state.current_round = 2;
        state.next_round_pending = true;

        let snapshot = state.snapshot(&Ledger::default());

        assert_eq!(snapshot.current_round, 2);
        assert_eq!(snapshot.round_limit, 3);
        assert!(snapshot.next_round_pending);
        assert!(snapshot.scores.is_empty());
        assert!(snapshot.validate().is_ok());
    }
}
