use crate::error::ProtocolError;
use crate::model::participant::ParticipantId;
use crate::model::session::SessionId;
use serde::{Deserialize, Serialize};

/// Offer, answer or ICE candidate produced by the media layer. The relay and
/// the negotiation coordinator carry it without looking inside.
pub type NegotiationBlob = serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

/// Every frame exchanged with the relay: one JSON object per text frame,
/// discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ControlMessage {
    /// Client asks to enter a room, optionally proposing its own id.
    #[serde(rename_all = "camelCase")]
    Join {
        room_id: SessionId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<ParticipantId>,
    },

    /// Current head count. The copy sent to a joiner also names the joiner.
    #[serde(rename_all = "camelCase")]
    RoomInfo {
        room_id: SessionId,
        participant_count: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<ParticipantId>,
    },

    RoomFull,

    #[serde(rename_all = "camelCase")]
    UserJoined { user_id: ParticipantId },

    #[serde(rename_all = "camelCase")]
    UserLeft { user_id: ParticipantId },

    #[serde(rename_all = "camelCase")]
    Offer {
        to: ParticipantId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<ParticipantId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<SessionId>,
        offer: NegotiationBlob,
    },

    #[serde(rename_all = "camelCase")]
    Answer {
        to: ParticipantId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<ParticipantId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<SessionId>,
        answer: NegotiationBlob,
    },

    #[serde(rename_all = "camelCase")]
    IceCandidate {
        to: ParticipantId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<ParticipantId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<SessionId>,
        candidate: NegotiationBlob,
    },

    Error { error: String },
}

impl ControlMessage {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Wire name of the variant, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::RoomInfo { .. } => "room-info",
            Self::RoomFull => "room-full",
            Self::UserJoined { .. } => "user-joined",
            Self::UserLeft { .. } => "user-left",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::IceCandidate { .. } => "ice-candidate",
            Self::Error { .. } => "error",
        }
    }

    pub fn offer(to: ParticipantId, room_id: Option<SessionId>, offer: NegotiationBlob) -> Self {
        Self::Offer {
            to,
            from: None,
            room_id,
            offer,
        }
    }

    pub fn answer(to: ParticipantId, room_id: Option<SessionId>, answer: NegotiationBlob) -> Self {
        Self::Answer {
            to,
            from: None,
            room_id,
            answer,
        }
    }

    pub fn ice_candidate(
        to: ParticipantId,
        room_id: Option<SessionId>,
        candidate: NegotiationBlob,
    ) -> Self {
        Self::IceCandidate {
            to,
            from: None,
            room_id,
            candidate,
        }
    }

    /// Destination of a peer-to-peer message; `None` for everything else.
    pub fn destination(&self) -> Option<&ParticipantId> {
        match self {
            Self::Offer { to, .. } | Self::Answer { to, .. } | Self::IceCandidate { to, .. } => {
                Some(to)
            }
            _ => None,
        }
    }

    pub fn sender(&self) -> Option<&ParticipantId> {
        match self {
            Self::Offer { from, .. } | Self::Answer { from, .. } | Self::IceCandidate { from, .. } => {
                from.as_ref()
            }
            _ => None,
        }
    }

    /// Overwrite `from` and `roomId` on a peer-to-peer message with the values
    /// the relay knows to be true. Other variants pass through untouched.
    pub fn stamped(self, sender: &ParticipantId, room: &SessionId) -> Self {
        match self {
            Self::Offer { to, offer, .. } => Self::Offer {
                to,
                from: Some(sender.clone()),
                room_id: Some(room.clone()),
                offer,
            },
            Self::Answer { to, answer, .. } => Self::Answer {
                to,
                from: Some(sender.clone()),
                room_id: Some(room.clone()),
                answer,
            },
            Self::IceCandidate { to, candidate, .. } => Self::IceCandidate {
                to,
                from: Some(sender.clone()),
                room_id: Some(room.clone()),
                candidate,
            },
            other => other,
        }
    }
}
