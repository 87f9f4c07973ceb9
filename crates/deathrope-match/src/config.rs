//! Match configuration.

use serde::{Deserialize, Serialize};

/// Round limit and timer durations for one match.
///
/// All durations are in seconds of simulation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Number of rounds in the match.
    pub round_limit: u32,

    /// Cooldown between a round ending and the next one starting.
    pub time_before_next_round_secs: f32,

    /// Length of the round clock.
    pub time_remaining_secs: f32,

    /// The 3..2..1 countdown at the start of each round.
    pub countdown_secs: f32,

    /// Scene clients return to when the match is over.
    pub offline_scene: String,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            round_limit: 3,
            time_before_next_round_secs: 3.0,
            time_remaining_secs: 120.0,
            countdown_secs: 3.0,
            offline_scene: "Title".to_string(),
        }
    }
}

impl MatchConfig {
    /// Creates a default config with the given round limit.
    pub fn with_round_limit(round_limit: u32) -> Self {
        Self {
            round_limit,
            ..Default::default()
        }
    }

    /// Fixes out-of-range values so the config is safe to use.
    ///
    /// - `round_limit` is at least 1.
    /// - Negative or non-finite durations become 0.
    pub fn validated(mut self) -> Self {
        if self.round_limit == 0 {
            tracing::warn!("round_limit of 0 is not playable, using 1");
            self.round_limit = 1;
        }
        for (name, value) in [
            ("time_before_next_round_secs", &mut self.time_before_next_round_secs),
            ("time_remaining_secs", &mut self.time_remaining_secs),
            ("countdown_secs", &mut self.countdown_secs),
        ] {
            if !value.is_finite() || *value < 0.0 {
                tracing::warn!(field = name, value = *value, "invalid duration, using 0");
                *value = 0.0;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MatchConfig::default();
        assert_eq!(config.round_limit, 3);
        assert_eq!(config.time_before_next_round_secs, 3.0);
        assert_eq!(config.countdown_secs, 3.0);
        assert_eq!(config.offline_scene, "Title");
    }

    #[test]
    fn test_validated_clamps_zero_round_limit() {
        let config = MatchConfig::with_round_limit(0).validated();
        assert_eq!(config.round_limit, 1);
    }

    #[test]
    fn test_validated_zeroes_bad_durations() {
        let config = MatchConfig {
            countdown_secs: -2.0,
            time_remaining_secs: f32::NAN,
            ..MatchConfig::default()
        }
        .validated();
        assert_eq!(config.countdown_secs, 0.0);
        assert_eq!(config.time_remaining_secs, 0.0);
        assert_eq!(config.time_before_next_round_secs, 3.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: MatchConfig = serde_json::from_str(r#"{ "round_limit": 7 }"#).unwrap();
        assert_eq!(config.round_limit, 7);
        assert_eq!(config.time_remaining_secs, 120.0);
    }
}
