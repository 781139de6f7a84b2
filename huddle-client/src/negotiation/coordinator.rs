use crate::config::DEFAULT_ANSWER_TIMEOUT;
use crate::negotiation::{
    LinkEvent, LinkState, MAX_NEGOTIATION_ATTEMPTS, MediaCapability, MediaEvent, MediaEventSink,
    MediaSession, PeerLink, Role, StepResult,
};
use huddle_core::{ControlMessage, NegotiationBlob, ParticipantId, SessionId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorOutput {
    /// A message for the relay.
    Signal(ControlMessage),
    LinkEstablished(ParticipantId),
    LinkFailed { peer: ParticipantId, terminal: bool },
}

/// Owns every [`PeerLink`] and decides who offers to whom.
///
/// Whoever sees `user-joined` for a peer initiates toward it; whoever gets an
/// unsolicited offer responds. Capability calls run on spawned tasks and
/// report back through [`next_event`](Self::next_event); a report whose
/// generation no longer matches its link is discarded.
///
/// An offer that stays unanswered for the answer timeout fails the link, so
/// a peer that dropped our offer is renegotiated through the retry path.
pub struct Coordinator {
    capability: Arc<dyn MediaCapability>,
    links: HashMap<ParticipantId, PeerLink>,
    local_id: Option<ParticipantId>,
    room: SessionId,
    retry_delay: Duration,
    answer_timeout: Duration,
    next_generation: u64,
    events_tx: mpsc::UnboundedSender<LinkEvent>,
    events_rx: mpsc::UnboundedReceiver<LinkEvent>,
}

impl Coordinator {
    pub fn new(capability: Arc<dyn MediaCapability>, room: SessionId, retry_delay: Duration) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            capability,
            links: HashMap::new(),
            local_id: None,
            room,
            retry_delay,
            answer_timeout: DEFAULT_ANSWER_TIMEOUT,
            next_generation: 0,
            events_tx,
            events_rx,
        }
    }

    pub fn with_answer_timeout(mut self, timeout: Duration) -> Self {
        self.answer_timeout = timeout;
        self
    }

    pub fn set_local_id(&mut self, id: ParticipantId) {
        self.local_id = Some(id);
    }

    pub fn local_id(&self) -> Option<&ParticipantId> {
        self.local_id.as_ref()
    }

    pub fn link_state(&self, peer: &ParticipantId) -> Option<LinkState> {
        self.links.get(peer).map(|link| link.state)
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Next completion or media report. Never returns `None` while `self`
    /// is alive.
    pub async fn next_event(&mut self) -> Option<LinkEvent> {
        self.events_rx.recv().await
    }

    pub fn handle_signal(&mut self, message: ControlMessage) -> Vec<CoordinatorOutput> {
        match message {
            ControlMessage::UserJoined { user_id } => self.on_peer_joined(user_id),
            ControlMessage::UserLeft { user_id } => {
                if self.remove_link(&user_id) {
                    info!(peer = %user_id, "Peer left, link removed");
                }
                Vec::new()
            }
            ControlMessage::Offer {
                from: Some(peer),
                offer,
                ..
            } => self.on_offer(peer, offer),
            ControlMessage::Answer {
                from: Some(peer),
                answer,
                ..
            } => {
                self.on_answer(peer, answer);
                Vec::new()
            }
            ControlMessage::IceCandidate {
                from: Some(peer),
                candidate,
                ..
            } => {
                self.on_remote_candidate(peer, candidate);
                Vec::new()
            }
            message @ (ControlMessage::Offer { from: None, .. }
            | ControlMessage::Answer { from: None, .. }
            | ControlMessage::IceCandidate { from: None, .. }) => {
                warn!(kind = message.kind(), "Signal without sender, dropping");
                Vec::new()
            }
            other => {
                debug!(kind = other.kind(), "Not a negotiation message");
                Vec::new()
            }
        }
    }

    pub fn handle_event(&mut self, event: LinkEvent) -> Vec<CoordinatorOutput> {
        let peer = event.peer().clone();
        let generation = event.generation();

        let current = self
            .links
            .get(&peer)
            .is_some_and(|link| link.generation == generation);

        if !current {
            debug!(peer = %peer, generation, "Stale link event, ignoring");
            if let LinkEvent::StepDone { result, .. } = event {
                discard(result);
            }
            return Vec::new();
        }

        match event {
            LinkEvent::Media { event, .. } => self.on_media_event(peer, event),
            LinkEvent::StepDone { result, .. } => self.on_step_done(peer, result),
            LinkEvent::RetryDue { .. } => self.on_retry_due(peer),
            LinkEvent::AnswerTimeout { .. } => self.on_answer_timeout(peer),
        }
    }

    /// Drop every link and close its session. In-flight steps become stale.
    pub fn reset_all(&mut self) {
        if self.links.is_empty() {
            return;
        }

        info!(links = self.links.len(), "Tearing down all peer links");
        for (_, mut link) in self.links.drain() {
            if let Some(handle) = link.take_handle() {
                close_session(handle);
            }
        }
    }

    fn on_peer_joined(&mut self, peer: ParticipantId) -> Vec<CoordinatorOutput> {
        if self.is_local(&peer) {
            return Vec::new();
        }

        self.remove_link(&peer);
        info!(peer = %peer, "Peer joined, initiating");
        self.start_initiator(peer, 0);
        Vec::new()
    }

    fn on_offer(&mut self, peer: ParticipantId, offer: NegotiationBlob) -> Vec<CoordinatorOutput> {
        if self.is_local(&peer) {
            return Vec::new();
        }

        let failures = match self.links.get(&peer) {
            Some(link) if link.state.is_initiating() && !self.yields_to(&peer) => {
                info!(peer = %peer, "Offer glare, keeping our own offer");
                return Vec::new();
            }
            Some(link) if link.state.is_terminal() => 0,
            Some(link) => link.failures,
            None => 0,
        };

        self.remove_link(&peer);
        debug!(peer = %peer, "Offer received, responding");
        self.start_responder(peer, offer, failures);
        Vec::new()
    }

    fn on_answer(&mut self, peer: ParticipantId, answer: NegotiationBlob) {
        let Some(link) = self.links.get(&peer) else {
            debug!(peer = %peer, "Answer from unknown peer, dropping");
            return;
        };

        let (LinkState::OfferSent, Some(handle)) = (link.state, link.handle.clone()) else {
            debug!(peer = %peer, state = ?link.state, "Unexpected answer, dropping");
            return;
        };

        let generation = link.generation;
        let tx = self.events_tx.clone();

        tokio::spawn(async move {
            let result = match handle.apply_answer(answer).await {
                Ok(()) => StepResult::AnswerApplied,
                Err(error) => StepResult::Failed {
                    handle: None,
                    error,
                },
            };
            let _ = tx.send(LinkEvent::StepDone {
                peer,
                generation,
                result,
            });
        });
    }

    fn on_remote_candidate(&mut self, peer: ParticipantId, candidate: NegotiationBlob) {
        let Some(link) = self.links.get_mut(&peer) else {
            debug!(peer = %peer, "Candidate from unknown peer, dropping");
            return;
        };

        match (link.state, link.handle.clone()) {
            (LinkState::Failed { .. }, _) => {
                debug!(peer = %peer, "Candidate for failed link, dropping");
            }
            (state, Some(handle)) if state.accepts_candidates() => {
                add_candidates(handle, peer, vec![candidate]);
            }
            _ => link.pending_candidates.push(candidate),
        }
    }

    fn on_media_event(&mut self, peer: ParticipantId, event: MediaEvent) -> Vec<CoordinatorOutput> {
        match event {
            MediaEvent::LocalCandidate(candidate) => {
                vec![CoordinatorOutput::Signal(ControlMessage::ice_candidate(
                    peer,
                    Some(self.room.clone()),
                    candidate,
                ))]
            }
            MediaEvent::Connected => {
                let Some(link) = self.links.get_mut(&peer) else {
                    return Vec::new();
                };
                if link.state == LinkState::Established {
                    return Vec::new();
                }

                link.state = LinkState::Established;
                link.failures = 0;
                info!(peer = %peer, role = ?link.role, "Peer link established");
                vec![CoordinatorOutput::LinkEstablished(peer)]
            }
            MediaEvent::Failed(reason) => self.fail_link(peer, reason),
        }
    }

    fn on_step_done(&mut self, peer: ParticipantId, result: StepResult) -> Vec<CoordinatorOutput> {
        let room = self.room.clone();
        let Some(link) = self.links.get_mut(&peer) else {
            return Vec::new();
        };

        match result {
            StepResult::Offered { handle, offer } => {
                link.handle = Some(handle);
                link.state = LinkState::OfferSent;
                send_after(
                    self.events_tx.clone(),
                    self.answer_timeout,
                    LinkEvent::AnswerTimeout {
                        peer: peer.clone(),
                        generation: link.generation,
                    },
                );
                debug!(peer = %peer, "Sending offer");
                vec![CoordinatorOutput::Signal(ControlMessage::offer(
                    peer,
                    Some(room),
                    offer,
                ))]
            }
            StepResult::Answered { handle, answer } => {
                link.handle = Some(handle.clone());
                // The session may already have reported itself connected.
                if link.state != LinkState::Established {
                    link.state = LinkState::Answered;
                }
                flush_candidates(link, handle, &peer);
                debug!(peer = %peer, "Sending answer");
                vec![CoordinatorOutput::Signal(ControlMessage::answer(
                    peer,
                    Some(room),
                    answer,
                ))]
            }
            StepResult::AnswerApplied => {
                if link.state == LinkState::OfferSent {
                    link.state = LinkState::Answered;
                }
                if let Some(handle) = link.handle.clone() {
                    flush_candidates(link, handle, &peer);
                }
                Vec::new()
            }
            StepResult::Failed { handle, error } => {
                if let Some(handle) = handle {
                    close_session(handle);
                }
                self.fail_link(peer, error.to_string())
            }
        }
    }

    fn on_retry_due(&mut self, peer: ParticipantId) -> Vec<CoordinatorOutput> {
        let Some(link) = self.links.get(&peer) else {
            return Vec::new();
        };
        if link.state != (LinkState::Failed { terminal: false }) {
            return Vec::new();
        }

        let failures = link.failures;
        self.links.remove(&peer);
        info!(peer = %peer, attempt = failures + 1, "Retrying negotiation as initiator");
        self.start_initiator(peer, failures);
        Vec::new()
    }

    fn on_answer_timeout(&mut self, peer: ParticipantId) -> Vec<CoordinatorOutput> {
        let waiting = self
            .links
            .get(&peer)
            .is_some_and(|link| link.state == LinkState::OfferSent);
        if !waiting {
            return Vec::new();
        }

        let reason = format!("no answer within {:?}", self.answer_timeout);
        self.fail_link(peer, reason)
    }

    fn fail_link(&mut self, peer: ParticipantId, reason: String) -> Vec<CoordinatorOutput> {
        // Reports from the discarded session must not reach the retry.
        let generation = self.bump_generation();

        let Some(link) = self.links.get_mut(&peer) else {
            return Vec::new();
        };
        if link.state.is_terminal() {
            return Vec::new();
        }

        link.failures += 1;
        link.generation = generation;
        link.pending_candidates.clear();
        if let Some(handle) = link.take_handle() {
            close_session(handle);
        }

        let terminal = link.failures >= MAX_NEGOTIATION_ATTEMPTS;
        link.state = LinkState::Failed { terminal };

        if terminal {
            warn!(peer = %peer, failures = link.failures, "Negotiation failed, giving up: {}", reason);
        } else {
            warn!(peer = %peer, "Negotiation failed, retrying: {}", reason);
            send_after(
                self.events_tx.clone(),
                self.retry_delay,
                LinkEvent::RetryDue {
                    peer: peer.clone(),
                    generation,
                },
            );
        }

        vec![CoordinatorOutput::LinkFailed { peer, terminal }]
    }

    fn start_initiator(&mut self, peer: ParticipantId, failures: u32) {
        let generation = self.bump_generation();
        self.links
            .insert(peer.clone(), PeerLink::new(generation, Role::Initiator, failures));

        let capability = self.capability.clone();
        let sink = MediaEventSink::new(peer.clone(), generation, self.events_tx.clone());
        let tx = self.events_tx.clone();

        tokio::spawn(async move {
            let result = match capability.open(&peer, sink).await {
                Err(error) => StepResult::Failed {
                    handle: None,
                    error,
                },
                Ok(handle) => match handle.create_offer().await {
                    Ok(offer) => StepResult::Offered { handle, offer },
                    Err(error) => StepResult::Failed {
                        handle: Some(handle),
                        error,
                    },
                },
            };
            let _ = tx.send(LinkEvent::StepDone {
                peer,
                generation,
                result,
            });
        });
    }

    fn start_responder(&mut self, peer: ParticipantId, offer: NegotiationBlob, failures: u32) {
        let generation = self.bump_generation();
        self.links
            .insert(peer.clone(), PeerLink::new(generation, Role::Responder, failures));

        let capability = self.capability.clone();
        let sink = MediaEventSink::new(peer.clone(), generation, self.events_tx.clone());
        let tx = self.events_tx.clone();

        tokio::spawn(async move {
            let result = match capability.open(&peer, sink).await {
                Err(error) => StepResult::Failed {
                    handle: None,
                    error,
                },
                Ok(handle) => match handle.accept_offer(offer).await {
                    Ok(answer) => StepResult::Answered { handle, answer },
                    Err(error) => StepResult::Failed {
                        handle: Some(handle),
                        error,
                    },
                },
            };
            let _ = tx.send(LinkEvent::StepDone {
                peer,
                generation,
                result,
            });
        });
    }

    fn remove_link(&mut self, peer: &ParticipantId) -> bool {
        let Some(mut link) = self.links.remove(peer) else {
            return false;
        };
        if let Some(handle) = link.take_handle() {
            close_session(handle);
        }
        true
    }

    fn is_local(&self, peer: &ParticipantId) -> bool {
        self.local_id.as_ref() == Some(peer)
    }

    /// On glare the smaller id gives up its own offer. Without a known local
    /// id we always yield.
    fn yields_to(&self, peer: &ParticipantId) -> bool {
        match &self.local_id {
            Some(local) => local < peer,
            None => true,
        }
    }

    fn bump_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}

fn send_after(tx: mpsc::UnboundedSender<LinkEvent>, delay: Duration, event: LinkEvent) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = tx.send(event);
    });
}

fn flush_candidates(link: &mut PeerLink, handle: Arc<dyn MediaSession>, peer: &ParticipantId) {
    if link.pending_candidates.is_empty() {
        return;
    }
    let pending = std::mem::take(&mut link.pending_candidates);
    debug!(peer = %peer, count = pending.len(), "Applying buffered candidates");
    add_candidates(handle, peer.clone(), pending);
}

fn add_candidates(handle: Arc<dyn MediaSession>, peer: ParticipantId, candidates: Vec<NegotiationBlob>) {
    tokio::spawn(async move {
        for candidate in candidates {
            if let Err(e) = handle.add_ice_candidate(candidate).await {
                warn!(peer = %peer, "Failed to add remote candidate: {}", e);
            }
        }
    });
}

fn close_session(handle: Arc<dyn MediaSession>) {
    tokio::spawn(async move {
        handle.close().await;
    });
}

fn discard(result: StepResult) {
    match result {
        StepResult::Offered { handle, .. }
        | StepResult::Answered { handle, .. }
        | StepResult::Failed {
            handle: Some(handle),
            ..
        } => close_session(handle),
        StepResult::AnswerApplied | StepResult::Failed { handle: None, .. } => {}
    }
}
