use crate::error::NegotiationError;
use crate::negotiation::{MediaCapability, MediaEventSink, MediaSession};
use async_trait::async_trait;
use huddle_core::{IceServerConfig, NegotiationBlob, ParticipantId};
use std::sync::Arc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

const DATA_CHANNEL_LABEL: &str = "huddle";

fn capability_error(e: webrtc::Error) -> NegotiationError {
    NegotiationError::Capability(e.to_string())
}

/// Media sessions backed by the `webrtc` crate. Blobs use the browser's JSON
/// shapes (`{type, sdp}` and `RTCIceCandidateInit`), so native and browser
/// peers can negotiate with each other.
#[derive(Debug, Clone)]
pub struct WebRtcCapability {
    ice_servers: Vec<IceServerConfig>,
}

impl WebRtcCapability {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self { ice_servers }
    }

    fn rtc_config(&self) -> RTCConfiguration {
        let ice_servers = self
            .ice_servers
            .iter()
            .map(|server| RTCIceServer {
                urls: server.urls.clone(),
                username: server.username.clone().unwrap_or_default(),
                credential: server.credential.clone().unwrap_or_default(),
                ..Default::default()
            })
            .collect();

        RTCConfiguration {
            ice_servers,
            ..Default::default()
        }
    }
}

#[async_trait]
impl MediaCapability for WebRtcCapability {
    async fn open(
        &self,
        remote: &ParticipantId,
        events: MediaEventSink,
    ) -> Result<Arc<dyn MediaSession>, NegotiationError> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(capability_error)?;

        let registry = register_default_interceptors(Registry::new(), &mut media_engine)
            .map_err(capability_error)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let peer_connection = Arc::new(
            api.new_peer_connection(self.rtc_config())
                .await
                .map_err(capability_error)?,
        );

        let state_events = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |state: RTCPeerConnectionState| {
                let events = state_events.clone();

                Box::pin(async move {
                    debug!(peer = %events.peer(), ?state, "Peer connection state changed");
                    match state {
                        RTCPeerConnectionState::Connected => events.connected(),
                        RTCPeerConnectionState::Failed => events.failed("peer connection failed"),
                        _ => {}
                    }
                })
            },
        ));

        let candidate_events = events;
        peer_connection.on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
            let events = candidate_events.clone();

            Box::pin(async move {
                let Some(candidate) = candidate else { return };
                let blob = candidate
                    .to_json()
                    .map_err(capability_error)
                    .and_then(|init| serde_json::to_value(init).map_err(NegotiationError::from));

                match blob {
                    Ok(blob) => events.local_candidate(blob),
                    Err(e) => warn!(peer = %events.peer(), "Dropping local candidate: {}", e),
                }
            })
        }));

        info!(peer = %remote, "Media session opened");
        Ok(Arc::new(WebRtcSession { peer_connection }))
    }
}

struct WebRtcSession {
    peer_connection: Arc<RTCPeerConnection>,
}

impl WebRtcSession {
    async fn set_local(&self, description: RTCSessionDescription) -> Result<NegotiationBlob, NegotiationError> {
        self.peer_connection
            .set_local_description(description.clone())
            .await
            .map_err(capability_error)?;
        Ok(serde_json::to_value(description)?)
    }
}

#[async_trait]
impl MediaSession for WebRtcSession {
    async fn create_offer(&self) -> Result<NegotiationBlob, NegotiationError> {
        // An offer without any m-line has nothing to negotiate.
        self.peer_connection
            .create_data_channel(DATA_CHANNEL_LABEL, None)
            .await
            .map_err(capability_error)?;

        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .map_err(capability_error)?;
        self.set_local(offer).await
    }

    async fn accept_offer(&self, offer: NegotiationBlob) -> Result<NegotiationBlob, NegotiationError> {
        let offer: RTCSessionDescription = serde_json::from_value(offer)?;
        self.peer_connection
            .set_remote_description(offer)
            .await
            .map_err(capability_error)?;

        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(capability_error)?;
        self.set_local(answer).await
    }

    async fn apply_answer(&self, answer: NegotiationBlob) -> Result<(), NegotiationError> {
        let answer: RTCSessionDescription = serde_json::from_value(answer)?;
        self.peer_connection
            .set_remote_description(answer)
            .await
            .map_err(capability_error)
    }

    async fn add_ice_candidate(&self, candidate: NegotiationBlob) -> Result<(), NegotiationError> {
        let candidate: RTCIceCandidateInit = serde_json::from_value(candidate)?;
        self.peer_connection
            .add_ice_candidate(candidate)
            .await
            .map_err(capability_error)
    }

    async fn close(&self) {
        if let Err(e) = self.peer_connection.close().await {
            debug!("Error while closing peer connection: {}", e);
        }
    }
}
