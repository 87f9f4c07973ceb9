//! The network collaborator boundary.
//!
//! The match core never touches sockets. A [`MatchSession`](crate::MatchSession)
//! calls into a [`MatchNetwork`] to replicate messages, spawn team entities,
//! and change or leave scenes. The transport behind it is the game's
//! business.

use deathrope_protocol::{Codec, Envelope, JsonCodec, Recipient, TeamId, TeamInfo};
use tokio::sync::mpsc;

use crate::SessionError;

/// Everything the match core asks of the networking layer.
///
/// `Send + 'static` because the session (and its network) moves into the
/// match server task.
pub trait MatchNetwork: Send + 'static {
    /// Replicates an envelope to `recipient`.
    fn send(&mut self, recipient: Recipient, envelope: &Envelope) -> Result<(), SessionError>;

    /// Spawns the networked entity for a team.
    fn spawn_team(&mut self, team: &TeamInfo) -> Result<(), SessionError>;

    /// Spawns the players that are ready to join `team`.
    fn spawn_ready_players(&mut self, team: TeamId) -> Result<(), SessionError>;

    /// Moves the server (and every client) to another scene.
    fn change_scene(&mut self, scene: &str) -> Result<(), SessionError>;

    /// Stops hosting and sends everyone to `offline_scene`.
    fn stop_server(&mut self, offline_scene: &str) -> Result<(), SessionError>;

    /// Disconnects this client.
    fn stop_client(&mut self) -> Result<(), SessionError>;
}

// ---------------------------------------------------------------------------
// ChannelNetwork
// ---------------------------------------------------------------------------

/// One call made on a [`ChannelNetwork`].
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkEvent {
    /// An encoded [`Envelope`].
    Send { recipient: Recipient, frame: Vec<u8> },
    SpawnTeam(TeamInfo),
    SpawnReadyPlayers(TeamId),
    ChangeScene(String),
    StopServer { offline_scene: String },
    StopClient,
}

impl NetworkEvent {
    /// Decodes the envelope carried by a `Send` event.
    pub fn envelope(&self) -> Option<Result<Envelope, SessionError>> {
        match self {
            Self::Send { frame, .. } => Some(JsonCodec.decode(frame).map_err(Into::into)),
            _ => None,
        }
    }
}

/// A [`MatchNetwork`] that encodes envelopes as JSON and forwards every
/// call to an unbounded channel.
///
/// Whoever holds the receiver plays the transport: a real socket pump, a
/// local client loop, or a test asserting on what was sent.
#[derive(Debug, Clone)]
pub struct ChannelNetwork {
    tx: mpsc::UnboundedSender<NetworkEvent>,
    codec: JsonCodec,
}

impl ChannelNetwork {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NetworkEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                codec: JsonCodec,
            },
            rx,
        )
    }

    fn emit(&self, event: NetworkEvent) -> Result<(), SessionError> {
        self.tx.send(event).map_err(|_| SessionError::NetworkClosed)
    }
}

impl MatchNetwork for ChannelNetwork {
    fn send(&mut self, recipient: Recipient, envelope: &Envelope) -> Result<(), SessionError> {
        let frame = self.codec.encode(envelope)?;
        tracing::trace!(seq = envelope.seq, ?recipient, bytes = frame.len(), "replicating");
        self.emit(NetworkEvent::Send { recipient, frame })
    }

    fn spawn_team(&mut self, team: &TeamInfo) -> Result<(), SessionError> {
        self.emit(NetworkEvent::SpawnTeam(team.clone()))
    }

    fn spawn_ready_players(&mut self, team: TeamId) -> Result<(), SessionError> {
        self.emit(NetworkEvent::SpawnReadyPlayers(team))
    }

    fn change_scene(&mut self, scene: &str) -> Result<(), SessionError> {
        self.emit(NetworkEvent::ChangeScene(scene.to_string()))
    }

    fn stop_server(&mut self, offline_scene: &str) -> Result<(), SessionError> {
        self.emit(NetworkEvent::StopServer {
            offline_scene: offline_scene.to_string(),
        })
    }

    fn stop_client(&mut self) -> Result<(), SessionError> {
        self.emit(NetworkEvent::StopClient)
    }
}

#[cfg(test)]
mod tests {
    use deathrope_protocol::MatchMessage;

    use super::*;

    #[test]
    fn test_send_encodes_envelope_into_frame() {
        let (mut net, mut rx) = ChannelNetwork::new();
        let envelope = Envelope {
            seq: 4,
            tick: 10,
            payload: MatchMessage::RoundStarted { round: 1 },
        };

        net.send(Recipient::All, &envelope).unwrap();

        let event = rx.try_recv().unwrap();
        assert!(matches!(event, NetworkEvent::Send { recipient: Recipient::All, .. }));
        assert_eq!(event.envelope().unwrap().unwrap(), envelope);
    }

    #[test]
    fn test_envelope_on_non_send_event_is_none() {
        assert!(NetworkEvent::StopClient.envelope().is_none());
    }

    #[test]
    fn test_emit_after_receiver_dropped_is_network_closed() {
        let (mut net, rx) = ChannelNetwork::new();
        drop(rx);

        let err = net.change_scene("Cliffs_Level").unwrap_err();
        assert!(matches!(err, SessionError::NetworkClosed));
    }
}
