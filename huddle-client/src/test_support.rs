//! In-memory stand-ins for the media layer and the relay connection.

use crate::error::{NegotiationError, TransportError};
use crate::negotiation::{MediaCapability, MediaEventSink, MediaSession};
use crate::transport::{IncomingFrame, OutgoingFrame, RelayConnector, RelayLink};
use async_trait::async_trait;
use huddle_core::{ControlMessage, NegotiationBlob, ParticipantId};
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Default)]
struct FakeMedia {
    calls: Mutex<Vec<String>>,
    failing_steps: AtomicU32,
    sinks: Mutex<Vec<MediaEventSink>>,
}

impl FakeMedia {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn step(&self, name: &str, peer: &ParticipantId) -> Result<(), NegotiationError> {
        let fail = self
            .failing_steps
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(NegotiationError::Capability(format!("{name} refused")));
        }
        self.record(format!("{name} {peer}"));
        Ok(())
    }
}

/// Records every call as `"<call> <peer>"`.
#[derive(Clone, Default)]
pub(crate) struct FakeCapability {
    media: Arc<FakeMedia>,
}

impl FakeCapability {
    pub fn calls(&self) -> Vec<String> {
        self.media.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    /// Make the next `n` offer/answer steps fail.
    pub fn fail_next_steps(&self, n: u32) {
        self.media.failing_steps.store(n, Ordering::SeqCst);
    }

    /// The sink handed to the most recent session for `peer`.
    pub fn sink_for(&self, peer: &ParticipantId) -> MediaEventSink {
        self.media
            .sinks
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|sink| sink.peer() == peer)
            .cloned()
            .expect("no session opened for peer")
    }
}

#[async_trait]
impl MediaCapability for FakeCapability {
    async fn open(
        &self,
        remote: &ParticipantId,
        events: MediaEventSink,
    ) -> Result<Arc<dyn MediaSession>, NegotiationError> {
        self.media.record(format!("open {remote}"));
        self.media.sinks.lock().unwrap().push(events);

        Ok(Arc::new(FakeSession {
            peer: remote.clone(),
            media: self.media.clone(),
        }))
    }
}

struct FakeSession {
    peer: ParticipantId,
    media: Arc<FakeMedia>,
}

#[async_trait]
impl MediaSession for FakeSession {
    async fn create_offer(&self) -> Result<NegotiationBlob, NegotiationError> {
        self.media.step("offer", &self.peer)?;
        Ok(json!({"type": "offer", "sdp": format!("offer-for-{}", self.peer)}))
    }

    async fn accept_offer(&self, _offer: NegotiationBlob) -> Result<NegotiationBlob, NegotiationError> {
        self.media.step("accept", &self.peer)?;
        Ok(json!({"type": "answer", "sdp": format!("answer-for-{}", self.peer)}))
    }

    async fn apply_answer(&self, _answer: NegotiationBlob) -> Result<(), NegotiationError> {
        self.media.record(format!("apply {}", self.peer));
        Ok(())
    }

    async fn add_ice_candidate(&self, _candidate: NegotiationBlob) -> Result<(), NegotiationError> {
        self.media.record(format!("ice {}", self.peer));
        Ok(())
    }

    async fn close(&self) {
        self.media.record(format!("close {}", self.peer));
    }
}

/// The relay's end of a fake connection.
pub(crate) struct RelaySide {
    incoming: mpsc::UnboundedSender<IncomingFrame>,
    outgoing: mpsc::UnboundedReceiver<OutgoingFrame>,
}

impl RelaySide {
    pub fn push(&self, message: &ControlMessage) {
        let text = message.encode().unwrap();
        let _ = self.incoming.send(IncomingFrame::Text(text));
    }

    pub fn drop_connection(&self, normal: bool) {
        let _ = self.incoming.send(IncomingFrame::Closed { normal });
    }

    pub async fn next_frame(&mut self) -> Option<OutgoingFrame> {
        self.outgoing.recv().await
    }

    pub async fn next_message(&mut self) -> ControlMessage {
        match self.next_frame().await {
            Some(OutgoingFrame::Text(text)) => ControlMessage::decode(&text).unwrap(),
            other => panic!("expected a text frame, got {other:?}"),
        }
    }
}

struct FakeRelay {
    accepted: mpsc::UnboundedSender<RelaySide>,
    refuse: AtomicBool,
    attempts: AtomicU32,
}

#[derive(Clone)]
pub(crate) struct FakeConnector {
    relay: Arc<FakeRelay>,
}

impl FakeConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RelaySide>) {
        let (accepted, rx) = mpsc::unbounded_channel();
        let connector = Self {
            relay: Arc::new(FakeRelay {
                accepted,
                refuse: AtomicBool::new(false),
                attempts: AtomicU32::new(0),
            }),
        };
        (connector, rx)
    }

    pub fn refuse_all(&self) {
        self.relay.refuse.store(true, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> u32 {
        self.relay.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelayConnector for FakeConnector {
    async fn connect(&self, url: &str) -> Result<RelayLink, TransportError> {
        self.relay.attempts.fetch_add(1, Ordering::SeqCst);

        if self.relay.refuse.load(Ordering::SeqCst) {
            return Err(TransportError::Connect {
                url: url.to_owned(),
                reason: "refused".to_owned(),
            });
        }

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let _ = self.relay.accepted.send(RelaySide {
            incoming: in_tx,
            outgoing: out_rx,
        });

        Ok(RelayLink {
            outgoing: out_tx,
            incoming: in_rx,
        })
    }
}
