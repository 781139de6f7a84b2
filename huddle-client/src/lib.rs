//! Client side of the signaling protocol: joins a room through the relay,
//! negotiates a media link with every other member and keeps the relay
//! connection alive.

pub mod config;
pub mod engine;
pub mod error;
pub mod negotiation;
pub mod reconnect;
pub mod transport;

#[cfg(feature = "webrtc")]
pub mod media;

#[cfg(test)]
mod test_support;

pub use config::{ClientConfig, IdentityPolicy};
pub use engine::{ClientEvent, ClientHandle, spawn_client, spawn_ws_client};
pub use error::{NegotiationError, TransportError};
pub use negotiation::{MediaCapability, MediaEventSink, MediaSession};
pub use reconnect::{BackoffPolicy, ConnectionStatus, DisconnectReason, LinearBackoff};
pub use transport::{RelayConnector, WsConnector};

#[cfg(feature = "webrtc")]
pub use media::WebRtcCapability;
