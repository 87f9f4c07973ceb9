//! Side effects requested by the round controller.

use deathrope_protocol::{MatchMessage, Recipient};

/// Something the session layer must do after a controller call.
///
/// Controllers never talk to the network or the filesystem themselves.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchEffect {
    /// Replicate a message to participants.
    Broadcast(Recipient, MatchMessage),

    /// Append a line to the match log.
    Log(String),

    /// The match is over: stop the session and send everyone to
    /// `offline_scene`.
    Teardown { offline_scene: String },
}

impl MatchEffect {
    /// Shorthand for a broadcast to everyone.
    pub fn to_all(message: MatchMessage) -> Self {
        Self::Broadcast(Recipient::All, message)
    }
}
