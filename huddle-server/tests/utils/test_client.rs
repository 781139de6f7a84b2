use anyhow::{Context, Result, bail};
use futures::{SinkExt, StreamExt};
use huddle_core::{ControlMessage, ParticipantId, SessionId};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);
const QUIET_PERIOD: Duration = Duration::from_millis(200);

/// Bare WebSocket participant speaking the control protocol by hand.
pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    /// Identity announced by the relay in the joiner's room-info.
    pub id: Option<ParticipantId>,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let (ws, _) = connect_async(format!("ws://{addr}/ws"))
            .await
            .context("Failed to connect to relay")?;
        Ok(Self { ws, id: None })
    }

    pub async fn send(&mut self, message: &ControlMessage) -> Result<()> {
        self.send_raw(&message.encode()?).await
    }

    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.ws
            .send(Message::Text(text.to_owned().into()))
            .await
            .context("Failed to send frame")
    }

    pub async fn send_binary(&mut self, data: &[u8]) -> Result<()> {
        self.ws
            .send(Message::Binary(data.to_vec().into()))
            .await
            .context("Failed to send frame")
    }

    /// Next control message, skipping pings and pongs.
    pub async fn recv(&mut self) -> Result<ControlMessage> {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.ws.next())
                .await
                .context("Timeout waiting for a message")?;

            match frame {
                Some(Ok(Message::Text(text))) => return Ok(ControlMessage::decode(text.as_str())?),
                Some(Ok(Message::Close(_))) | None => bail!("Connection closed"),
                Some(Ok(_)) => continue,
                Some(Err(e)) => bail!("WebSocket error: {e}"),
            }
        }
    }

    /// True if nothing arrives within a short quiet period.
    pub async fn is_quiet(&mut self) -> bool {
        tokio::time::timeout(QUIET_PERIOD, self.ws.next())
            .await
            .is_err()
    }

    /// Read and discard until the connection goes quiet.
    pub async fn drain(&mut self) -> Vec<ControlMessage> {
        let mut seen = Vec::new();
        while let Ok(Some(Ok(Message::Text(text)))) =
            tokio::time::timeout(QUIET_PERIOD, self.ws.next()).await
        {
            if let Ok(message) = ControlMessage::decode(text.as_str()) {
                seen.push(message);
            }
        }
        seen
    }

    /// Send a join and return the relay's reply. On room-info the assigned
    /// id is remembered.
    pub async fn join(&mut self, room: &str) -> Result<ControlMessage> {
        self.send(&ControlMessage::Join {
            room_id: SessionId::from(room),
            user_id: None,
        })
        .await?;

        let reply = self.recv().await?;
        if let ControlMessage::RoomInfo {
            user_id: Some(id), ..
        } = &reply
        {
            self.id = Some(id.clone());
        }
        Ok(reply)
    }

    pub fn participant(&self) -> ParticipantId {
        self.id.clone().expect("client has not joined")
    }

    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await.context("Failed to close")?;
        Ok(())
    }
}
