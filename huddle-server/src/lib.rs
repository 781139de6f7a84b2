//! WebSocket signaling relay: room membership plus addressed forwarding of
//! offers, answers and ICE candidates between participants.

pub mod config;
pub mod error;
pub mod room;
pub mod routes;
pub mod signaling;
pub mod transport;

pub use config::{ConfigError, RelayConfig};
pub use error::{DeliveryError, RegistryError};
pub use room::*;
pub use routes::{router, serve, serve_with_shutdown};
pub use signaling::*;
pub use transport::*;
