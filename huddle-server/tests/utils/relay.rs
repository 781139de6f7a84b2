use huddle_server::{RelayConfig, RelayService, serve};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Serve a relay on an ephemeral localhost port for the rest of the test.
pub async fn spawn_relay(config: RelayConfig) -> (SocketAddr, RelayService) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");

    let service = RelayService::new(config);
    tokio::spawn(serve(listener, service.clone()));

    (addr, service)
}

pub async fn spawn_default_relay() -> (SocketAddr, RelayService) {
    spawn_relay(RelayConfig::default()).await
}
