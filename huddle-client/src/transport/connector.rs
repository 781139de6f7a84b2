use crate::error::TransportError;
use async_trait::async_trait;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutgoingFrame {
    Text(String),
    /// Close with a normal-closure code.
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingFrame {
    Text(String),
    /// The socket is gone. `normal` is true only for a normal-closure code.
    Closed { normal: bool },
}

/// Both directions of an open relay connection.
#[derive(Debug)]
pub struct RelayLink {
    pub outgoing: mpsc::UnboundedSender<OutgoingFrame>,
    pub incoming: mpsc::UnboundedReceiver<IncomingFrame>,
}

impl RelayLink {
    pub fn send_text(&self, text: String) -> Result<(), TransportError> {
        self.outgoing
            .send(OutgoingFrame::Text(text))
            .map_err(|_| TransportError::Closed)
    }

    pub fn close(&self) {
        let _ = self.outgoing.send(OutgoingFrame::Close);
    }
}

#[async_trait]
pub trait RelayConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<RelayLink, TransportError>;
}
