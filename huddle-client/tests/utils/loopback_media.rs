use async_trait::async_trait;
use huddle_client::{MediaCapability, MediaEventSink, MediaSession, NegotiationError};
use huddle_core::{NegotiationBlob, ParticipantId};
use serde_json::json;
use std::sync::Arc;

/// Media layer that "connects" as soon as both descriptions are exchanged.
#[derive(Debug, Clone, Default)]
pub struct LoopbackMedia;

#[async_trait]
impl MediaCapability for LoopbackMedia {
    async fn open(
        &self,
        remote: &ParticipantId,
        events: MediaEventSink,
    ) -> Result<Arc<dyn MediaSession>, NegotiationError> {
        Ok(Arc::new(LoopbackSession {
            remote: remote.clone(),
            events,
        }))
    }
}

struct LoopbackSession {
    remote: ParticipantId,
    events: MediaEventSink,
}

#[async_trait]
impl MediaSession for LoopbackSession {
    async fn create_offer(&self) -> Result<NegotiationBlob, NegotiationError> {
        self.events
            .local_candidate(json!({"candidate": "candidate:1 1 udp 1 127.0.0.1 9 typ host"}));
        Ok(json!({"type": "offer", "sdp": format!("v=0 offer to {}", self.remote)}))
    }

    async fn accept_offer(&self, _offer: NegotiationBlob) -> Result<NegotiationBlob, NegotiationError> {
        self.events.connected();
        Ok(json!({"type": "answer", "sdp": format!("v=0 answer to {}", self.remote)}))
    }

    async fn apply_answer(&self, _answer: NegotiationBlob) -> Result<(), NegotiationError> {
        self.events.connected();
        Ok(())
    }

    async fn add_ice_candidate(&self, _candidate: NegotiationBlob) -> Result<(), NegotiationError> {
        Ok(())
    }

    async fn close(&self) {}
}
