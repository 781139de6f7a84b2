use crate::error::RegistryError;
use crate::room::session::{MembershipInfo, RemainingMembers, Session};
use crate::transport::ParticipantChannel;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use huddle_core::{ParticipantId, SessionId};
use tracing::{debug, info};

/// Room table shared by every connection.
///
/// Each operation runs under the shard lock for its room, so joins and leaves
/// on one room are linearizable while unrelated rooms proceed in parallel. No
/// method awaits or performs I/O while holding that lock.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Session>,
    capacity: usize,
}

impl SessionRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn join(
        &self,
        room: &SessionId,
        participant: ParticipantId,
        channel: ParticipantChannel,
    ) -> Result<MembershipInfo, RegistryError> {
        match self.sessions.entry(room.clone()) {
            Entry::Occupied(mut entry) => {
                let session = entry.get_mut();

                if session.contains(&participant) {
                    return Err(RegistryError::AlreadyMember {
                        room: room.clone(),
                        participant,
                    });
                }
                if session.len() >= self.capacity {
                    return Err(RegistryError::RoomFull {
                        room: room.clone(),
                        capacity: self.capacity,
                    });
                }

                let others = session.members_except(&participant);
                session.insert(participant, channel);

                Ok(MembershipInfo {
                    participant_count: session.len(),
                    others,
                })
            }
            Entry::Vacant(entry) => {
                info!(room = %room, "Creating room");
                let mut session = Session::default();
                session.insert(participant, channel);
                entry.insert(session);

                Ok(MembershipInfo {
                    participant_count: 1,
                    others: Vec::new(),
                })
            }
        }
    }

    /// Remove a participant. The room itself disappears with its last member.
    ///
    /// `NotFound` is expected when a connection closes twice or never joined;
    /// callers treat it as a no-op.
    pub fn leave(
        &self,
        room: &SessionId,
        participant: &ParticipantId,
    ) -> Result<RemainingMembers, RegistryError> {
        let not_found = || RegistryError::NotFound {
            room: room.clone(),
            participant: participant.clone(),
        };

        let Entry::Occupied(mut entry) = self.sessions.entry(room.clone()) else {
            return Err(not_found());
        };

        if entry.get_mut().remove(participant).is_none() {
            return Err(not_found());
        }

        let session = entry.get();
        let remaining = RemainingMembers {
            participant_count: session.len(),
            members: session.members_except(participant),
        };

        if session.is_empty() {
            entry.remove();
            info!(room = %room, "Room deleted (empty)");
        }

        Ok(remaining)
    }

    /// Channel of a current member, or `None` if it has already left.
    pub fn lookup(&self, room: &SessionId, participant: &ParticipantId) -> Option<ParticipantChannel> {
        let found = self.sessions.get(room)?.get(participant);
        if found.is_none() {
            debug!(room = %room, participant = %participant, "Lookup missed");
        }
        found
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn member_count(&self, room: &SessionId) -> usize {
        self.sessions.get(room).map(|s| s.len()).unwrap_or(0)
    }

    pub fn contains_session(&self, room: &SessionId) -> bool {
        self.sessions.contains_key(room)
    }

    pub fn members(&self, room: &SessionId) -> Vec<ParticipantId> {
        self.sessions
            .get(room)
            .map(|s| s.member_ids())
            .unwrap_or_default()
    }
}
