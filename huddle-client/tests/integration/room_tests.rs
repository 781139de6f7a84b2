use huddle_client::{ConnectionStatus, DisconnectReason, spawn_ws_client};
use huddle_server::RelayConfig;
use std::sync::Arc;
use std::time::Duration;

use crate::integration::identity_of;
use crate::utils::{LoopbackMedia, client_config, init_tracing, spawn_relay};

#[tokio::test]
async fn test_full_room_stops_the_client() {
    init_tracing();
    let addr = spawn_relay(RelayConfig {
        room_capacity: 1,
        ..RelayConfig::default()
    })
    .await;

    let mut first = spawn_ws_client(client_config(addr, "tiny"), Arc::new(LoopbackMedia));
    identity_of(&mut first).await;

    let mut second = spawn_ws_client(client_config(addr, "tiny"), Arc::new(LoopbackMedia));
    let status = tokio::time::timeout(Duration::from_secs(5), second.wait_terminal())
        .await
        .expect("Timeout waiting for room-full");

    assert_eq!(
        status,
        ConnectionStatus::Disconnected(DisconnectReason::RoomFull)
    );
    assert_eq!(first.status(), ConnectionStatus::Connected);
    first.leave().await;
}

#[tokio::test]
async fn test_rejected_room_id_stops_the_client() {
    init_tracing();
    let addr = spawn_relay(RelayConfig {
        max_room_id_len: 8,
        ..RelayConfig::default()
    })
    .await;

    for room in ["", "far-too-long-a-name"] {
        let mut client = spawn_ws_client(client_config(addr, room), Arc::new(LoopbackMedia));
        let status = tokio::time::timeout(Duration::from_secs(5), client.wait_terminal())
            .await
            .expect("Timeout waiting for the rejected join");

        assert!(
            matches!(
                &status,
                ConnectionStatus::Disconnected(DisconnectReason::JoinRejected(reason))
                    if reason.contains("room id")
            ),
            "unexpected status for {room:?}: {status:?}"
        );
    }
}

#[tokio::test]
async fn test_unreachable_relay_gives_up() {
    init_tracing();

    // Bind then drop to get a port with nothing listening.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let config = client_config(addr, "abc")
        .with_backoff(huddle_client::LinearBackoff::new(Duration::from_millis(10), 3));
    let mut client = spawn_ws_client(config, Arc::new(LoopbackMedia));

    let status = tokio::time::timeout(Duration::from_secs(5), client.wait_terminal())
        .await
        .expect("Timeout waiting for the client to give up");

    assert_eq!(
        status,
        ConnectionStatus::Disconnected(DisconnectReason::RetriesExhausted { attempts: 3 })
    );
}
