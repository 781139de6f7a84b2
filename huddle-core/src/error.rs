use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed control message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("room id must be between 1 and {max} bytes, got {len}")]
    InvalidRoomId { len: usize, max: usize },

    #[error("participant id {0:?} is not well-formed")]
    InvalidParticipantId(String),
}
