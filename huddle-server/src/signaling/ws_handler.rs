use crate::signaling::{ChannelHandler, RelayService};
use crate::transport::ParticipantChannel;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<RelayService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

async fn handle_socket(socket: WebSocket, service: RelayService) {
    let (mut sender, mut receiver) = socket.split();
    let (channel, mut rx) = ParticipantChannel::new(service.config().channel_buffer);

    let mut handler = ChannelHandler::new(service, channel);
    let participant = handler.participant().clone();
    info!(participant = %participant, "New WebSocket connection");

    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => handler.handle_frame(text.as_str()),
                Ok(Message::Binary(_)) => {
                    warn!(participant = %handler.participant(), "Binary frame, dropping");
                }
                Ok(Message::Close(frame)) => {
                    debug!(participant = %handler.participant(), ?frame, "Close frame received");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    debug!(participant = %handler.participant(), "WebSocket error: {}", e);
                    break;
                }
            }
        }

        handler.close();
    });

    // An aborted reader drops its handler, which still runs the leave path.
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    info!(participant = %participant, "WebSocket disconnected");
}
