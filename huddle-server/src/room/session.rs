use crate::transport::ParticipantChannel;
use huddle_core::ParticipantId;
use std::collections::HashMap;

/// A participant together with the handle used to reach it.
#[derive(Clone, Debug)]
pub struct Member {
    pub id: ParticipantId,
    pub channel: ParticipantChannel,
}

/// Result of a successful join, captured while the room was locked.
#[derive(Clone, Debug)]
pub struct MembershipInfo {
    /// Head count including the newcomer.
    pub participant_count: usize,
    /// Everyone who was already present.
    pub others: Vec<Member>,
}

/// Who is left after a leave, captured while the room was locked.
#[derive(Clone, Debug)]
pub struct RemainingMembers {
    pub participant_count: usize,
    pub members: Vec<Member>,
}

#[derive(Debug, Default)]
pub(crate) struct Session {
    members: HashMap<ParticipantId, ParticipantChannel>,
}

impl Session {
    pub(crate) fn len(&self) -> usize {
        self.members.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(crate) fn contains(&self, participant: &ParticipantId) -> bool {
        self.members.contains_key(participant)
    }

    pub(crate) fn insert(&mut self, participant: ParticipantId, channel: ParticipantChannel) {
        self.members.insert(participant, channel);
    }

    pub(crate) fn remove(&mut self, participant: &ParticipantId) -> Option<ParticipantChannel> {
        self.members.remove(participant)
    }

    pub(crate) fn get(&self, participant: &ParticipantId) -> Option<ParticipantChannel> {
        self.members.get(participant).cloned()
    }

    pub(crate) fn members_except(&self, excluded: &ParticipantId) -> Vec<Member> {
        self.members
            .iter()
            .filter(|(id, _)| *id != excluded)
            .map(|(id, channel)| Member {
                id: id.clone(),
                channel: channel.clone(),
            })
            .collect()
    }

    pub(crate) fn member_ids(&self) -> Vec<ParticipantId> {
        self.members.keys().cloned().collect()
    }
}
