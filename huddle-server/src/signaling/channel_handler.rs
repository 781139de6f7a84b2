use crate::error::RegistryError;
use crate::signaling::RelayService;
use crate::transport::ParticipantChannel;
use huddle_core::{ControlMessage, ParticipantId, SessionId};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerState {
    Unjoined,
    Joined(SessionId),
    Closed,
}

/// Per-connection protocol state: who this connection is and which room it
/// belongs to.
///
/// `close` runs the leave path at most once; it is also invoked on drop so
/// an aborted reader task still evicts the participant.
pub struct ChannelHandler {
    participant: ParticipantId,
    channel: ParticipantChannel,
    state: HandlerState,
    service: RelayService,
}

impl ChannelHandler {
    pub fn new(service: RelayService, channel: ParticipantChannel) -> Self {
        Self {
            participant: ParticipantId::generate(),
            channel,
            state: HandlerState::Unjoined,
            service,
        }
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }

    pub fn state(&self) -> &HandlerState {
        &self.state
    }

    /// Decode and apply one text frame. Undecodable frames are logged and
    /// dropped; the connection stays open.
    pub fn handle_frame(&mut self, text: &str) {
        match ControlMessage::decode(text) {
            Ok(message) => self.handle_message(message),
            Err(e) => warn!(participant = %self.participant, "Dropping frame: {}", e),
        }
    }

    pub fn handle_message(&mut self, message: ControlMessage) {
        use ControlMessage as M;

        match (self.state.clone(), message) {
            (HandlerState::Closed, message) => {
                debug!(participant = %self.participant, kind = message.kind(), "Message after close");
            }

            (HandlerState::Unjoined, M::Join { room_id, user_id }) => self.join(room_id, user_id),

            (HandlerState::Joined(room), M::Join { room_id, .. }) => {
                warn!(
                    participant = %self.participant,
                    current = %room,
                    requested = %room_id,
                    "Join while already in a room"
                );
                self.reply(&M::Error {
                    error: format!("already joined room {room}"),
                });
            }

            (
                HandlerState::Joined(room),
                message @ (M::Offer { .. } | M::Answer { .. } | M::IceCandidate { .. }),
            ) => self.forward(&room, message),

            (
                HandlerState::Unjoined,
                message @ (M::Offer { .. } | M::Answer { .. } | M::IceCandidate { .. }),
            ) => {
                warn!(participant = %self.participant, kind = message.kind(), "Signal before join, dropping");
            }

            (
                _,
                message @ (M::RoomInfo { .. }
                | M::RoomFull
                | M::UserJoined { .. }
                | M::UserLeft { .. }
                | M::Error { .. }),
            ) => {
                warn!(participant = %self.participant, kind = message.kind(), "Relay-only message from client, dropping");
            }
        }
    }

    fn join(&mut self, room_id: SessionId, requested: Option<ParticipantId>) {
        let room = match room_id.validated(self.service.config().max_room_id_len) {
            Ok(room) => room,
            Err(e) => {
                warn!(participant = %self.participant, "Rejected join: {}", e);
                self.reply(&ControlMessage::Error {
                    error: e.to_string(),
                });
                return;
            }
        };

        let requested = requested.and_then(|id| match ParticipantId::parse(id.as_str()) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(participant = %self.participant, "Ignoring proposed id: {}", e);
                None
            }
        });

        let registry = self.service.registry();
        let mut identity = requested.unwrap_or_else(|| self.participant.clone());

        let mut result = registry.join(&room, identity.clone(), self.channel.clone());
        if matches!(result, Err(RegistryError::AlreadyMember { .. })) && identity != self.participant {
            debug!(room = %room, proposed = %identity, "Proposed id taken, keeping minted id");
            identity = self.participant.clone();
            result = registry.join(&room, identity.clone(), self.channel.clone());
        }

        let membership = match result {
            Ok(membership) => membership,
            Err(RegistryError::RoomFull { capacity, .. }) => {
                info!(participant = %self.participant, room = %room, capacity, "Room is full");
                self.reply(&ControlMessage::RoomFull);
                return;
            }
            Err(e) => {
                warn!(participant = %self.participant, room = %room, "Join failed: {}", e);
                self.reply(&ControlMessage::Error {
                    error: e.to_string(),
                });
                return;
            }
        };

        self.participant = identity;
        self.state = HandlerState::Joined(room.clone());

        info!(
            participant = %self.participant,
            room = %room,
            size = membership.participant_count,
            "Participant joined room"
        );

        self.reply(&ControlMessage::RoomInfo {
            room_id: room.clone(),
            participant_count: membership.participant_count,
            user_id: Some(self.participant.clone()),
        });

        self.service.dispatcher().broadcast(
            &membership.others,
            &[
                ControlMessage::UserJoined {
                    user_id: self.participant.clone(),
                },
                ControlMessage::RoomInfo {
                    room_id: room,
                    participant_count: membership.participant_count,
                    user_id: None,
                },
            ],
        );
    }

    fn forward(&self, room: &SessionId, message: ControlMessage) {
        if message.destination() == Some(&self.participant) {
            debug!(participant = %self.participant, kind = message.kind(), "Signal addressed to self, dropping");
            return;
        }

        let stamped = message.stamped(&self.participant, room);
        self.service.dispatcher().route(room, stamped);
    }

    fn reply(&self, message: &ControlMessage) {
        if let Err(e) = self.channel.send(message) {
            warn!(participant = %self.participant, kind = message.kind(), "Failed to reply: {}", e);
        }
    }

    /// Leave the current room, if any, and notify whoever remains.
    pub fn close(&mut self) {
        let previous = std::mem::replace(&mut self.state, HandlerState::Closed);

        let room = match previous {
            HandlerState::Closed => return,
            HandlerState::Unjoined => {
                info!(participant = %self.participant, "Connection closed before joining");
                return;
            }
            HandlerState::Joined(room) => room,
        };

        match self.service.registry().leave(&room, &self.participant) {
            Ok(remaining) => {
                info!(
                    participant = %self.participant,
                    room = %room,
                    size = remaining.participant_count,
                    "Participant left room"
                );

                self.service.dispatcher().broadcast(
                    &remaining.members,
                    &[
                        ControlMessage::UserLeft {
                            user_id: self.participant.clone(),
                        },
                        ControlMessage::RoomInfo {
                            room_id: room,
                            participant_count: remaining.participant_count,
                            user_id: None,
                        },
                    ],
                );
            }
            Err(e) => debug!(participant = %self.participant, "Leave was a no-op: {}", e),
        }
    }
}

impl Drop for ChannelHandler {
    fn drop(&mut self) {
        self.close();
    }
}
