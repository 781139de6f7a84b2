use crate::negotiation::MediaSession;
use huddle_core::NegotiationBlob;
use std::fmt;
use std::sync::Arc;

/// Failed attempts after which a link stays down until the peer reappears.
pub const MAX_NEGOTIATION_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Session being opened and offer being created.
    Idle,
    OfferSent,
    /// Remote offer being applied and answer being created.
    OfferReceived,
    Answered,
    Established,
    Failed { terminal: bool },
}

impl LinkState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed { terminal: true })
    }

    /// True while this side is still working toward sending its own offer.
    pub fn is_initiating(&self) -> bool {
        matches!(self, Self::Idle | Self::OfferSent)
    }

    /// Remote candidates can be applied once both descriptions are in place.
    pub fn accepts_candidates(&self) -> bool {
        matches!(self, Self::Answered | Self::Established)
    }
}

/// Local bookkeeping for the connection to one remote participant.
pub struct PeerLink {
    pub generation: u64,
    pub role: Role,
    pub state: LinkState,
    pub handle: Option<Arc<dyn MediaSession>>,
    pub failures: u32,
    /// Remote candidates that arrived before they could be applied.
    pub pending_candidates: Vec<NegotiationBlob>,
}

impl PeerLink {
    pub fn new(generation: u64, role: Role, failures: u32) -> Self {
        let state = match role {
            Role::Initiator => LinkState::Idle,
            Role::Responder => LinkState::OfferReceived,
        };

        Self {
            generation,
            role,
            state,
            handle: None,
            failures,
            pending_candidates: Vec::new(),
        }
    }

    pub fn take_handle(&mut self) -> Option<Arc<dyn MediaSession>> {
        self.handle.take()
    }
}

impl fmt::Debug for PeerLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerLink")
            .field("generation", &self.generation)
            .field("role", &self.role)
            .field("state", &self.state)
            .field("has_handle", &self.handle.is_some())
            .field("failures", &self.failures)
            .field("pending_candidates", &self.pending_candidates.len())
            .finish()
    }
}
