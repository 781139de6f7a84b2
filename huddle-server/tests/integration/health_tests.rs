use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::utils::{TestClient, init_tracing, spawn_default_relay};

async fn get_root(addr: std::net::SocketAddr) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn test_health_reports_room_count() {
    init_tracing();
    let (addr, _service) = spawn_default_relay().await;

    let response = get_root(addr).await;
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains(r#""status":"ok""#));
    assert!(response.contains(r#""rooms":0"#));

    let mut alice = TestClient::connect(addr).await.unwrap();
    alice.join("abc").await.unwrap();

    assert!(get_root(addr).await.contains(r#""rooms":1"#));
}
