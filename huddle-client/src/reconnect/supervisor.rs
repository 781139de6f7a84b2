use crate::reconnect::BackoffPolicy;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The application asked to leave.
    Left,
    RoomFull,
    /// The relay answered our join with an error.
    JoinRejected(String),
    /// The relay closed the socket with a normal-closure code.
    ClosedByRelay,
    RetriesExhausted { attempts: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Idle,
    Connecting { attempt: u32 },
    Joining,
    Connected,
    Reconnecting { attempt: u32, delay: Duration },
    /// Terminal. Reported at most once.
    Disconnected(DisconnectReason),
}

impl ConnectionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disconnected(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    Start,
    TransportOpened,
    /// A connect attempt did not produce a socket.
    TransportFailed,
    TransportClosed { normal: bool },
    /// The relay acknowledged our join with room-info.
    Joined,
    RoomFull,
    /// The relay answered the join with `error` instead of room-info.
    JoinRejected(String),
    RetryDue,
    Leave,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorAction {
    Connect,
    TearDownLinks,
    SendJoin,
    ScheduleRetry(Duration),
    CloseTransport,
    ReportStatus(ConnectionStatus),
}

/// Connection lifecycle as a plain state machine: events in, actions out.
/// Timers and sockets belong to whoever executes the actions.
#[derive(Debug)]
pub struct Supervisor {
    status: ConnectionStatus,
    attempt: u32,
    policy: Box<dyn BackoffPolicy>,
}

impl Supervisor {
    pub fn new(policy: Box<dyn BackoffPolicy>) -> Self {
        Self {
            status: ConnectionStatus::Idle,
            attempt: 0,
            policy,
        }
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    /// Consecutive failed connections since the last successful join.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn handle(&mut self, event: SupervisorEvent) -> Vec<SupervisorAction> {
        use ConnectionStatus as S;
        use SupervisorAction as A;
        use SupervisorEvent as E;

        if self.status.is_terminal() {
            debug!(?event, "Supervisor stopped, ignoring event");
            return Vec::new();
        }

        match (self.status.clone(), event) {
            (S::Idle, E::Start) => self.enter(S::Connecting { attempt: 0 }, vec![A::Connect]),

            (S::Connecting { .. }, E::TransportOpened) => {
                // Links from a previous connection are stale once we rejoin.
                self.enter(S::Joining, vec![A::TearDownLinks, A::SendJoin])
            }

            (S::Joining, E::Joined) => {
                self.attempt = 0;
                self.enter(S::Connected, Vec::new())
            }

            (S::Joining, E::RoomFull) => self.stop(DisconnectReason::RoomFull, vec![A::CloseTransport]),

            (S::Joining, E::JoinRejected(reason)) => {
                warn!(%reason, "Relay rejected our join");
                self.stop(DisconnectReason::JoinRejected(reason), vec![A::CloseTransport])
            }

            (S::Connecting { .. }, E::TransportFailed)
            | (S::Connecting { .. } | S::Joining | S::Connected, E::TransportClosed { normal: false }) => {
                self.connection_lost()
            }

            (S::Connecting { .. } | S::Joining | S::Connected, E::TransportClosed { normal: true }) => {
                self.stop(DisconnectReason::ClosedByRelay, Vec::new())
            }

            (S::Reconnecting { .. }, E::RetryDue) => self.enter(
                S::Connecting {
                    attempt: self.attempt,
                },
                vec![A::Connect],
            ),

            (_, E::Leave) => self.stop(DisconnectReason::Left, vec![A::CloseTransport]),

            (status, event) => {
                debug!(?status, ?event, "Event has no effect");
                Vec::new()
            }
        }
    }

    fn connection_lost(&mut self) -> Vec<SupervisorAction> {
        self.attempt += 1;

        match self.policy.delay(self.attempt) {
            Some(delay) => {
                info!(attempt = self.attempt, ?delay, "Relay connection lost, scheduling reconnect");
                self.enter(
                    ConnectionStatus::Reconnecting {
                        attempt: self.attempt,
                        delay,
                    },
                    vec![SupervisorAction::ScheduleRetry(delay)],
                )
            }
            None => {
                let attempts = self.attempt - 1;
                warn!(attempts, "Giving up on the relay");
                self.stop(DisconnectReason::RetriesExhausted { attempts }, Vec::new())
            }
        }
    }

    fn enter(
        &mut self,
        status: ConnectionStatus,
        mut actions: Vec<SupervisorAction>,
    ) -> Vec<SupervisorAction> {
        self.status = status.clone();
        actions.push(SupervisorAction::ReportStatus(status));
        actions
    }

    fn stop(
        &mut self,
        reason: DisconnectReason,
        mut actions: Vec<SupervisorAction>,
    ) -> Vec<SupervisorAction> {
        actions.push(SupervisorAction::TearDownLinks);
        self.enter(ConnectionStatus::Disconnected(reason), actions)
    }
}
