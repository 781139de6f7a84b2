use crate::error::TransportError;
use crate::transport::{IncomingFrame, OutgoingFrame, RelayConnector, RelayLink};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::{debug, info, warn};

/// Connects to the relay over WebSocket.
#[derive(Debug, Clone, Default)]
pub struct WsConnector;

#[async_trait]
impl RelayConnector for WsConnector {
    async fn connect(&self, url: &str) -> Result<RelayLink, TransportError> {
        let (socket, _) = connect_async(url)
            .await
            .map_err(|e| TransportError::Connect {
                url: url.to_owned(),
                reason: e.to_string(),
            })?;
        info!(url, "Connected to relay");

        let (mut sender, mut receiver) = socket.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<OutgoingFrame>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<IncomingFrame>();

        tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                let message = match frame {
                    OutgoingFrame::Text(text) => Message::Text(text.into()),
                    OutgoingFrame::Close => Message::Close(Some(CloseFrame {
                        code: CloseCode::Normal,
                        reason: "leaving".into(),
                    })),
                };
                let closing = matches!(message, Message::Close(_));

                if let Err(e) = sender.send(message).await {
                    debug!("Relay writer stopped: {}", e);
                    break;
                }
                if closing {
                    break;
                }
            }
        });

        tokio::spawn(async move {
            let mut normal = false;

            while let Some(message) = receiver.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        if in_tx.send(IncomingFrame::Text(text.as_str().to_owned())).is_err() {
                            return;
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        normal = frame.is_some_and(|f| f.code == CloseCode::Normal);
                        debug!(normal, "Relay closed the connection");
                        break;
                    }
                    Ok(Message::Binary(_)) => warn!("Binary frame from relay, dropping"),
                    Ok(_) => {}
                    Err(e) => {
                        debug!("Relay connection error: {}", e);
                        break;
                    }
                }
            }

            let _ = in_tx.send(IncomingFrame::Closed { normal });
        });

        Ok(RelayLink {
            outgoing: out_tx,
            incoming: in_rx,
        })
    }
}
