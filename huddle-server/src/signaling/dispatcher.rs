use crate::error::DeliveryError;
use crate::room::{Member, SessionRegistry};
use huddle_core::{ControlMessage, SessionId};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, PartialEq, Eq)]
pub enum RouteOutcome {
    Delivered,
    /// The addressee is not (or no longer) in the room.
    UnknownDestination,
    /// The message has no `to` field.
    NotRoutable,
    Dropped(DeliveryError),
}

/// Best-effort delivery of control messages. Nothing is retried or buffered
/// here; a lost signal is recovered by the next negotiation attempt.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    registry: Arc<SessionRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Forward a stamped peer-to-peer message to its addressee in `room`.
    pub fn route(&self, room: &SessionId, message: ControlMessage) -> RouteOutcome {
        let Some(to) = message.destination() else {
            return RouteOutcome::NotRoutable;
        };

        let Some(channel) = self.registry.lookup(room, to) else {
            debug!(
                room = %room,
                to = %to,
                kind = message.kind(),
                "Destination already left, dropping"
            );
            return RouteOutcome::UnknownDestination;
        };

        match channel.send(&message) {
            Ok(()) => RouteOutcome::Delivered,
            Err(e) => {
                warn!(room = %room, to = %to, kind = message.kind(), "Dropped signal: {}", e);
                RouteOutcome::Dropped(e)
            }
        }
    }

    /// Send `messages`, in order, to each of `members`.
    pub fn broadcast(&self, members: &[Member], messages: &[ControlMessage]) {
        for member in members {
            for message in messages {
                self.send_to(member, message);
            }
        }
    }

    pub fn send_to(&self, member: &Member, message: &ControlMessage) {
        if let Err(e) = member.channel.send(message) {
            warn!(
                participant = %member.id,
                kind = message.kind(),
                "Failed to deliver: {}",
                e
            );
        }
    }
}
