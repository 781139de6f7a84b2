use huddle_client::ClientConfig;
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

pub async fn spawn_relay(config: RelayConfig) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");

    tokio::spawn(serve(listener, RelayService::new(config)));
    addr
}

pub fn client_config(addr: SocketAddr, room: &str) -> ClientConfig {
    ClientConfig::new(format!("ws://{addr}/ws"), room).with_ice_servers(Vec::new())
}
