use crate::error::DeliveryError;
use huddle_core::ControlMessage;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Write half of one participant's WebSocket, as seen by everyone else.
///
/// Frames go into a bounded buffer drained by the connection's writer task.
/// Sending never waits: a full buffer drops the frame.
#[derive(Clone, Debug)]
pub struct ParticipantChannel {
    tx: mpsc::Sender<String>,
}

impl ParticipantChannel {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }

    pub fn send(&self, message: &ControlMessage) -> Result<(), DeliveryError> {
        let frame = message
            .encode()
            .map_err(|e| DeliveryError::Encode(e.to_string()))?;

        self.tx.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::Saturated,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
