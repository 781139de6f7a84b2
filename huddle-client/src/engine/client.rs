use crate::config::{ClientConfig, IdentityPolicy};
use crate::engine::ClientEvent;
use crate::error::TransportError;
use crate::negotiation::{Coordinator, CoordinatorOutput, MediaCapability};
use crate::reconnect::{ConnectionStatus, Supervisor, SupervisorAction, SupervisorEvent};
use crate::transport::{IncomingFrame, RelayConnector, RelayLink, WsConnector};
use futures::future::BoxFuture;
use huddle_core::{ControlMessage, ParticipantId};
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Roughly thirty years.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

enum ClientCommand {
    Leave,
}

/// Handle to a running client. Dropping it leaves the room.
pub struct ClientHandle {
    commands: mpsc::UnboundedSender<ClientCommand>,
    events: mpsc::UnboundedReceiver<ClientEvent>,
    status: watch::Receiver<ConnectionStatus>,
    task: JoinHandle<()>,
}

impl ClientHandle {
    pub async fn next_event(&mut self) -> Option<ClientEvent> {
        self.events.recv().await
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status.borrow().clone()
    }

    pub fn status_watch(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Wait until the client stops for good and return why.
    pub async fn wait_terminal(&mut self) -> ConnectionStatus {
        let waited = self
            .status
            .wait_for(|status| status.is_terminal())
            .await
            .map(|status| status.clone());
        waited.unwrap_or_else(|_| self.status.borrow().clone())
    }

    /// Close the relay connection with a normal-closure code and wait for the
    /// event loop to finish.
    pub async fn leave(self) {
        let _ = self.commands.send(ClientCommand::Leave);
        if let Err(e) = self.task.await {
            warn!("Client task ended abnormally: {}", e);
        }
    }
}

pub fn spawn_client(
    config: ClientConfig,
    connector: Arc<dyn RelayConnector>,
    capability: Arc<dyn MediaCapability>,
) -> ClientHandle {
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = watch::channel(ConnectionStatus::Idle);

    let engine = ClientEngine {
        supervisor: Supervisor::new(Box::new(config.backoff)),
        coordinator: Coordinator::new(
            capability,
            config.room_id.clone(),
            config.negotiation_retry_delay,
        )
        .with_answer_timeout(config.answer_timeout),
        config,
        connector,
        link: None,
        connecting: None,
        retry_at: None,
        identity: None,
        commands: commands_rx,
        events: events_tx,
        status: status_tx,
    };

    ClientHandle {
        commands: commands_tx,
        events: events_rx,
        status: status_rx,
        task: tokio::spawn(engine.run()),
    }
}

/// [`spawn_client`] over a real WebSocket connection.
pub fn spawn_ws_client(config: ClientConfig, capability: Arc<dyn MediaCapability>) -> ClientHandle {
    spawn_client(config, Arc::new(WsConnector), capability)
}

struct ClientEngine {
    config: ClientConfig,
    connector: Arc<dyn RelayConnector>,
    supervisor: Supervisor,
    coordinator: Coordinator,
    link: Option<RelayLink>,
    connecting: Option<BoxFuture<'static, Result<RelayLink, TransportError>>>,
    retry_at: Option<Instant>,
    identity: Option<ParticipantId>,
    commands: mpsc::UnboundedReceiver<ClientCommand>,
    events: mpsc::UnboundedSender<ClientEvent>,
    status: watch::Sender<ConnectionStatus>,
}

impl ClientEngine {
    async fn run(mut self) {
        info!(room = %self.config.room_id, url = %self.config.relay_url, "Client event loop started");
        self.apply(SupervisorEvent::Start);

        while !self.supervisor.status().is_terminal() {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(ClientCommand::Leave) | None => self.apply(SupervisorEvent::Leave),
                },

                result = poll_connect(&mut self.connecting) => {
                    self.connecting = None;
                    match result {
                        Ok(link) => {
                            self.link = Some(link);
                            self.apply(SupervisorEvent::TransportOpened);
                        }
                        Err(e) => {
                            warn!("Relay unreachable: {}", e);
                            self.apply(SupervisorEvent::TransportFailed);
                        }
                    }
                }

                frame = recv_frame(&mut self.link) => self.on_frame(frame),

                Some(event) = self.coordinator.next_event() => {
                    let outputs = self.coordinator.handle_event(event);
                    self.apply_outputs(outputs);
                }

                _ = sleep_until(self.retry_at) => {
                    self.retry_at = None;
                    self.apply(SupervisorEvent::RetryDue);
                }
            }
        }

        self.coordinator.reset_all();
        info!(status = ?self.supervisor.status(), "Client event loop finished");
    }

    fn apply(&mut self, event: SupervisorEvent) {
        for action in self.supervisor.handle(event) {
            match action {
                SupervisorAction::Connect => {
                    let connector = self.connector.clone();
                    let url = self.config.relay_url.clone();
                    self.connecting = Some(Box::pin(async move { connector.connect(&url).await }));
                }
                SupervisorAction::TearDownLinks => self.coordinator.reset_all(),
                SupervisorAction::SendJoin => self.send_join(),
                SupervisorAction::ScheduleRetry(delay) => {
                    self.retry_at = Some(retry_deadline(delay));
                }
                SupervisorAction::CloseTransport => {
                    self.connecting = None;
                    if let Some(link) = self.link.take() {
                        link.close();
                    }
                }
                SupervisorAction::ReportStatus(status) => {
                    self.status.send_replace(status.clone());
                    self.emit(ClientEvent::Status(status));
                }
            }
        }
    }

    fn on_frame(&mut self, frame: IncomingFrame) {
        match frame {
            IncomingFrame::Text(text) => match ControlMessage::decode(&text) {
                Ok(message) => self.on_control(message),
                Err(e) => warn!("Dropping frame from relay: {}", e),
            },
            IncomingFrame::Closed { normal } => {
                self.link = None;
                self.apply(SupervisorEvent::TransportClosed { normal });
            }
        }
    }

    fn on_control(&mut self, message: ControlMessage) {
        match &message {
            ControlMessage::RoomInfo {
                room_id,
                participant_count,
                user_id,
            } => {
                if let Some(id) = user_id {
                    info!(participant = %id, room = %room_id, "Relay assigned our id");
                    self.identity = Some(id.clone());
                    self.coordinator.set_local_id(id.clone());
                    self.emit(ClientEvent::Identity(id.clone()));
                }
                self.emit(ClientEvent::RoomInfo {
                    room_id: room_id.clone(),
                    participant_count: *participant_count,
                });
                if *self.supervisor.status() == ConnectionStatus::Joining {
                    self.apply(SupervisorEvent::Joined);
                }
                return;
            }
            ControlMessage::RoomFull => {
                warn!(room = %self.config.room_id, "Room is full");
                self.emit(ClientEvent::RoomFull);
                self.apply(SupervisorEvent::RoomFull);
                return;
            }
            ControlMessage::Error { error } => {
                warn!("Relay reported an error: {}", error);
                self.emit(ClientEvent::RelayError(error.clone()));
                self.apply(SupervisorEvent::JoinRejected(error.clone()));
                return;
            }
            ControlMessage::Join { .. } => {
                warn!("Unexpected join from relay, dropping");
                return;
            }
            ControlMessage::UserJoined { user_id } => {
                self.emit(ClientEvent::PeerJoined(user_id.clone()));
            }
            ControlMessage::UserLeft { user_id } => {
                self.emit(ClientEvent::PeerLeft(user_id.clone()));
            }
            ControlMessage::Offer { .. }
            | ControlMessage::Answer { .. }
            | ControlMessage::IceCandidate { .. } => {}
        }

        let outputs = self.coordinator.handle_signal(message);
        self.apply_outputs(outputs);
    }

    fn apply_outputs(&mut self, outputs: Vec<CoordinatorOutput>) {
        for output in outputs {
            match output {
                CoordinatorOutput::Signal(message) => self.send(&message),
                CoordinatorOutput::LinkEstablished(peer) => {
                    self.emit(ClientEvent::LinkEstablished(peer));
                }
                CoordinatorOutput::LinkFailed { peer, terminal } => {
                    self.emit(ClientEvent::LinkFailed { peer, terminal });
                }
            }
        }
    }

    fn send_join(&mut self) {
        let user_id = match self.config.identity {
            IdentityPolicy::Retain => self.identity.clone(),
            IdentityPolicy::MintFresh => None,
        };

        self.send(&ControlMessage::Join {
            room_id: self.config.room_id.clone(),
            user_id,
        });
    }

    fn send(&self, message: &ControlMessage) {
        let Some(link) = &self.link else {
            debug!(kind = message.kind(), "No relay connection, dropping");
            return;
        };

        match message.encode() {
            Ok(text) => {
                if let Err(e) = link.send_text(text) {
                    warn!(kind = message.kind(), "Failed to send: {}", e);
                }
            }
            Err(e) => warn!(kind = message.kind(), "Failed to encode: {}", e),
        }
    }

    fn emit(&self, event: ClientEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }
}

/// Delays past what `Instant` can hold are clamped to a far-off deadline.
fn retry_deadline(delay: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(delay).unwrap_or_else(|| now + FAR_FUTURE)
}

async fn poll_connect(
    connecting: &mut Option<BoxFuture<'static, Result<RelayLink, TransportError>>>,
) -> Result<RelayLink, TransportError> {
    match connecting {
        Some(future) => future.await,
        None => pending().await,
    }
}

async fn recv_frame(link: &mut Option<RelayLink>) -> IncomingFrame {
    match link {
        Some(link) => link
            .incoming
            .recv()
            .await
            .unwrap_or(IncomingFrame::Closed { normal: false }),
        None => pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => pending().await,
    }
}
