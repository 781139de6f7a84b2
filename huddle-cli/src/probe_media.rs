use async_trait::async_trait;
use huddle_client::{MediaCapability, MediaEventSink, MediaSession, NegotiationError};
use huddle_core::{NegotiationBlob, ParticipantId};
use std::sync::Arc;
use tracing::debug;

/// Media layer for a probe that only watches the room. Every negotiation it
/// is asked to take part in is declined, so peers see the link fail instead
/// of hanging.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProbeMedia;

#[async_trait]
impl MediaCapability for ProbeMedia {
    async fn open(
        &self,
        remote: &ParticipantId,
        _events: MediaEventSink,
    ) -> Result<Arc<dyn MediaSession>, NegotiationError> {
        debug!(peer = %remote, "Opening passive session");
        Ok(Arc::new(PassiveSession))
    }
}

struct PassiveSession;

fn declined() -> NegotiationError {
    NegotiationError::Capability("probe does not carry media".to_owned())
}

#[async_trait]
impl MediaSession for PassiveSession {
    async fn create_offer(&self) -> Result<NegotiationBlob, NegotiationError> {
        Err(declined())
    }

    async fn accept_offer(&self, _offer: NegotiationBlob) -> Result<NegotiationBlob, NegotiationError> {
        Err(declined())
    }

    async fn apply_answer(&self, _answer: NegotiationBlob) -> Result<(), NegotiationError> {
        Err(declined())
    }

    async fn add_ice_candidate(&self, _candidate: NegotiationBlob) -> Result<(), NegotiationError> {
        Ok(())
    }

    async fn close(&self) {}
}
