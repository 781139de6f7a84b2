use crate::error::NegotiationError;
use async_trait::async_trait;
use huddle_core::{NegotiationBlob, ParticipantId};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Something a session reports on its own schedule, outside of any step.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    LocalCandidate(NegotiationBlob),
    Connected,
    Failed(String),
}

/// Outcome of one asynchronous negotiation step.
pub enum StepResult {
    Offered {
        handle: Arc<dyn MediaSession>,
        offer: NegotiationBlob,
    },
    Answered {
        handle: Arc<dyn MediaSession>,
        answer: NegotiationBlob,
    },
    AnswerApplied,
    Failed {
        handle: Option<Arc<dyn MediaSession>>,
        error: NegotiationError,
    },
}

pub enum LinkEvent {
    Media {
        peer: ParticipantId,
        generation: u64,
        event: MediaEvent,
    },
    StepDone {
        peer: ParticipantId,
        generation: u64,
        result: StepResult,
    },
    RetryDue {
        peer: ParticipantId,
        generation: u64,
    },
    /// Our offer went unanswered for too long.
    AnswerTimeout {
        peer: ParticipantId,
        generation: u64,
    },
}

impl LinkEvent {
    pub fn peer(&self) -> &ParticipantId {
        match self {
            Self::Media { peer, .. }
            | Self::StepDone { peer, .. }
            | Self::RetryDue { peer, .. }
            | Self::AnswerTimeout { peer, .. } => peer,
        }
    }

    pub fn generation(&self) -> u64 {
        match self {
            Self::Media { generation, .. }
            | Self::StepDone { generation, .. }
            | Self::RetryDue { generation, .. }
            | Self::AnswerTimeout { generation, .. } => *generation,
        }
    }
}

/// Handed to a media session so it can report candidates and connection
/// state. Events carry the generation of the attempt that created the
/// session, so reports from a discarded session are ignored.
#[derive(Clone, Debug)]
pub struct MediaEventSink {
    peer: ParticipantId,
    generation: u64,
    tx: mpsc::UnboundedSender<LinkEvent>,
}

impl MediaEventSink {
    pub(crate) fn new(
        peer: ParticipantId,
        generation: u64,
        tx: mpsc::UnboundedSender<LinkEvent>,
    ) -> Self {
        Self {
            peer,
            generation,
            tx,
        }
    }

    pub fn peer(&self) -> &ParticipantId {
        &self.peer
    }

    pub fn local_candidate(&self, candidate: NegotiationBlob) {
        self.emit(MediaEvent::LocalCandidate(candidate));
    }

    pub fn connected(&self) {
        self.emit(MediaEvent::Connected);
    }

    pub fn failed(&self, reason: impl Into<String>) {
        self.emit(MediaEvent::Failed(reason.into()));
    }

    fn emit(&self, event: MediaEvent) {
        // The coordinator is gone; nobody is interested any more.
        let _ = self.tx.send(LinkEvent::Media {
            peer: self.peer.clone(),
            generation: self.generation,
            event,
        });
    }
}

/// Factory for media sessions, one per remote participant and attempt.
#[async_trait]
pub trait MediaCapability: Send + Sync {
    async fn open(
        &self,
        remote: &ParticipantId,
        events: MediaEventSink,
    ) -> Result<Arc<dyn MediaSession>, NegotiationError>;
}

/// One negotiated connection as the media layer sees it. Blobs are opaque to
/// the coordinator and the relay.
#[async_trait]
pub trait MediaSession: Send + Sync {
    async fn create_offer(&self) -> Result<NegotiationBlob, NegotiationError>;

    /// Apply a remote offer and produce the answer.
    async fn accept_offer(&self, offer: NegotiationBlob) -> Result<NegotiationBlob, NegotiationError>;

    async fn apply_answer(&self, answer: NegotiationBlob) -> Result<(), NegotiationError>;

    async fn add_ice_candidate(&self, candidate: NegotiationBlob) -> Result<(), NegotiationError>;

    async fn close(&self);
}
