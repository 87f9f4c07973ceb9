//! The built-in behavior states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What an AI agent is currently trying to do.
///
/// The evaluator treats these as opaque tags: it only compares them and
/// hands them back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BehaviorKind {
    /// Hold position and wait for something to react to.
    Idle,
    /// Engage the nearest enemy.
    Attack,
    /// Go for a power-up.
    PowerUp,
}

impl BehaviorKind {
    /// Every built-in kind, in declaration order (Idle, Attack, PowerUp).
    pub const ALL: [BehaviorKind; 3] = [Self::Idle, Self::Attack, Self::PowerUp];
}

impl fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Attack => write!(f, "Attack"),
            Self::PowerUp => write!(f, "PowerUp"),
        }
    }
}
