use huddle_core::{ControlMessage, SessionId};
use serde_json::json;

use crate::utils::{TestClient, init_tracing, spawn_default_relay};

#[tokio::test]
async fn test_disconnect_broadcasts_user_left_then_count() {
    init_tracing();
    let (addr, service) = spawn_default_relay().await;

    let mut alice = TestClient::connect(addr).await.unwrap();
    let mut bob = TestClient::connect(addr).await.unwrap();
    alice.join("abc").await.unwrap();
    bob.join("abc").await.unwrap();
    alice.drain().await;

    let bob_id = bob.participant();
    bob.close().await.unwrap();

    assert_eq!(
        alice.recv().await.unwrap(),
        ControlMessage::UserLeft { user_id: bob_id }
    );
    assert!(matches!(
        alice.recv().await.unwrap(),
        ControlMessage::RoomInfo {
            participant_count: 1,
            ..
        }
    ));
    assert_eq!(service.registry().member_count(&SessionId::from("abc")), 1);
}

#[tokio::test]
async fn test_stale_candidate_is_dropped_silently() {
    init_tracing();
    let (addr, _service) = spawn_default_relay().await;

    let mut alice = TestClient::connect(addr).await.unwrap();
    let mut bob = TestClient::connect(addr).await.unwrap();
    alice.join("abc").await.unwrap();
    bob.join("abc").await.unwrap();
    alice.drain().await;

    let bob_id = bob.participant();
    bob.close().await.unwrap();
    let seen = alice.drain().await;
    assert!(seen.contains(&ControlMessage::UserLeft {
        user_id: bob_id.clone()
    }));

    alice
        .send(&ControlMessage::ice_candidate(bob_id, None, json!({"candidate": ""})))
        .await
        .unwrap();
    assert!(alice.is_quiet().await);

    // The connection is still served.
    assert!(matches!(
        alice.join("elsewhere").await.unwrap(),
        ControlMessage::Error { .. }
    ));
}

#[tokio::test]
async fn test_last_leave_removes_room() {
    init_tracing();
    let (addr, service) = spawn_default_relay().await;

    let mut alice = TestClient::connect(addr).await.unwrap();
    alice.join("abc").await.unwrap();
    assert_eq!(service.registry().session_count(), 1);

    alice.close().await.unwrap();
    for _ in 0..50 {
        if service.registry().session_count() == 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert_eq!(service.registry().session_count(), 0);
}

#[tokio::test]
async fn test_malformed_frames_keep_connection_open() {
    init_tracing();
    let (addr, _service) = spawn_default_relay().await;

    let mut alice = TestClient::connect(addr).await.unwrap();
    alice.send_raw("not json at all").await.unwrap();
    alice.send_raw(r#"{"type":"teleport"}"#).await.unwrap();
    alice.send_binary(&[0xde, 0xad]).await.unwrap();
    assert!(alice.is_quiet().await);

    assert!(matches!(
        alice.join("abc").await.unwrap(),
        ControlMessage::RoomInfo { .. }
    ));
}
