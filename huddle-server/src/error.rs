use huddle_core::{ParticipantId, SessionId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("room {room} is full ({capacity} participants)")]
    RoomFull { room: SessionId, capacity: usize },

    #[error("participant {participant} is not a member of room {room}")]
    NotFound {
        room: SessionId,
        participant: ParticipantId,
    },

    #[error("participant {participant} is already a member of room {room}")]
    AlreadyMember {
        room: SessionId,
        participant: ParticipantId,
    },
}

/// Why a frame did not make it into a participant's outbound buffer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("outbound buffer is full")]
    Saturated,

    #[error("connection is closed")]
    Closed,

    #[error("failed to encode message: {0}")]
    Encode(String),
}
