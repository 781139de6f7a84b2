mod message;
mod participant;
mod session;

pub use message::{ControlMessage, IceServerConfig, NegotiationBlob};
pub use participant::ParticipantId;
pub use session::SessionId;
