use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("media capability failed: {0}")]
    Capability(String),

    #[error("malformed negotiation blob: {0}")]
    Blob(String),

    #[error("media session is closed")]
    Closed,
}

impl From<serde_json::Error> for NegotiationError {
    fn from(e: serde_json::Error) -> Self {
        Self::Blob(e.to_string())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("relay connection is closed")]
    Closed,
}
