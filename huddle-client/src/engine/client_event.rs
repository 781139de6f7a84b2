use crate::reconnect::ConnectionStatus;
use huddle_core::{ParticipantId, SessionId};

/// What the embedding application hears about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Status(ConnectionStatus),
    RoomInfo {
        room_id: SessionId,
        participant_count: usize,
    },
    /// Our own id for the current connection.
    Identity(ParticipantId),
    RoomFull,
    PeerJoined(ParticipantId),
    PeerLeft(ParticipantId),
    LinkEstablished(ParticipantId),
    LinkFailed {
        peer: ParticipantId,
        terminal: bool,
    },
    RelayError(String),
}
