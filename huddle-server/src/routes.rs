use crate::signaling::{RelayService, ws_handler};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub message: &'static str,
    pub rooms: usize,
}

async fn health(State(service): State<RelayService>) -> Json<Health> {
    Json(Health {
        status: "ok",
        message: "Signaling relay is running",
        rooms: service.registry().session_count(),
    })
}

/// Health check on `/`, the signaling socket on `/ws`.
pub fn router(service: RelayService) -> Router {
    // Browser clients are usually served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(service)
}

pub async fn serve(listener: TcpListener, service: RelayService) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Signaling relay listening on http://{}", addr);
    }
    axum::serve(listener, router(service)).await
}

/// Like [`serve`], returning once `shutdown` resolves and open connections drain.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    service: RelayService,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Signaling relay listening on http://{}", addr);
    }
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
}
