use crate::reconnect::LinearBackoff;
use huddle_core::utils::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};
use huddle_core::{IceServerConfig, SessionId};
use std::time::Duration;

/// Pause before a failed peer link is renegotiated.
pub const DEFAULT_NEGOTIATION_RETRY_DELAY: Duration = Duration::from_secs(1);

/// How long an offer may wait for its answer before the link counts as failed.
pub const DEFAULT_ANSWER_TIMEOUT: Duration = Duration::from_secs(10);

/// Which id to present when rejoining after a reconnect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdentityPolicy {
    /// Let the relay mint a new id on every connection.
    #[default]
    MintFresh,
    /// Propose the id from the previous connection. The relay falls back to
    /// a fresh one if it is already in use.
    Retain,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket URL of the relay, e.g. `ws://localhost:3001/ws`.
    pub relay_url: String,
    pub room_id: SessionId,
    pub ice_servers: Vec<IceServerConfig>,
    pub backoff: LinearBackoff,
    pub negotiation_retry_delay: Duration,
    pub answer_timeout: Duration,
    pub identity: IdentityPolicy,
}

impl ClientConfig {
    pub fn new(relay_url: impl Into<String>, room_id: impl Into<SessionId>) -> Self {
        Self {
            relay_url: relay_url.into(),
            room_id: room_id.into(),
            ice_servers: default_ice_servers(),
            backoff: LinearBackoff::default(),
            negotiation_retry_delay: DEFAULT_NEGOTIATION_RETRY_DELAY,
            answer_timeout: DEFAULT_ANSWER_TIMEOUT,
            identity: IdentityPolicy::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: LinearBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_identity(mut self, identity: IdentityPolicy) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_ice_servers(mut self, ice_servers: Vec<IceServerConfig>) -> Self {
        self.ice_servers = ice_servers;
        self
    }

    pub fn with_negotiation_retry_delay(mut self, delay: Duration) -> Self {
        self.negotiation_retry_delay = delay;
        self
    }

    pub fn with_answer_timeout(mut self, timeout: Duration) -> Self {
        self.answer_timeout = timeout;
        self
    }
}

pub fn default_ice_servers() -> Vec<IceServerConfig> {
    vec![IceServerConfig {
        urls: vec![DEFAULT_STUN_ADDR.to_owned(), DEFAULT_STUN_ADDR_2.to_owned()],
        username: None,
        credential: None,
    }]
}
