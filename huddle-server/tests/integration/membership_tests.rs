use huddle_core::{ControlMessage, SessionId};

use crate::utils::{TestClient, init_tracing, spawn_default_relay};

#[tokio::test]
async fn test_join_reports_room_info_with_assigned_id() {
    init_tracing();
    let (addr, service) = spawn_default_relay().await;

    let mut alice = TestClient::connect(addr).await.unwrap();
    let reply = alice.join("abc").await.unwrap();

    match reply {
        ControlMessage::RoomInfo {
            room_id,
            participant_count,
            user_id,
        } => {
            assert_eq!(room_id, SessionId::from("abc"));
            assert_eq!(participant_count, 1);
            assert!(user_id.is_some());
        }
        other => panic!("expected room-info, got {other:?}"),
    }
    assert_eq!(service.registry().member_count(&SessionId::from("abc")), 1);
}

#[tokio::test]
async fn test_existing_members_hear_about_newcomer() {
    init_tracing();
    let (addr, _service) = spawn_default_relay().await;

    let mut alice = TestClient::connect(addr).await.unwrap();
    let mut bob = TestClient::connect(addr).await.unwrap();
    alice.join("abc").await.unwrap();
    bob.join("abc").await.unwrap();

    assert_eq!(
        alice.recv().await.unwrap(),
        ControlMessage::UserJoined {
            user_id: bob.participant()
        }
    );
    assert!(matches!(
        alice.recv().await.unwrap(),
        ControlMessage::RoomInfo {
            participant_count: 2,
            user_id: None,
            ..
        }
    ));

    // The newcomer gets no user-joined about the people already present.
    assert!(bob.is_quiet().await);
}

#[tokio::test]
async fn test_eleventh_join_gets_room_full_and_no_broadcast() {
    init_tracing();
    let (addr, service) = spawn_default_relay().await;
    let room = SessionId::from("crowded");

    let mut members = Vec::new();
    for order in 1..=10 {
        let mut client = TestClient::connect(addr).await.unwrap();
        match client.join("crowded").await.unwrap() {
            ControlMessage::RoomInfo {
                participant_count, ..
            } => assert_eq!(participant_count, order),
            other => panic!("expected room-info, got {other:?}"),
        }
        members.push(client);
    }
    for member in &mut members {
        member.drain().await;
    }
    assert_eq!(service.registry().member_count(&room), 10);

    let mut late = TestClient::connect(addr).await.unwrap();
    assert_eq!(late.join("crowded").await.unwrap(), ControlMessage::RoomFull);

    for member in &mut members {
        assert!(member.is_quiet().await);
    }
    assert_eq!(service.registry().member_count(&room), 10);

    // Still unjoined, so another room is open to it.
    assert!(matches!(
        late.join("overflow").await.unwrap(),
        ControlMessage::RoomInfo {
            participant_count: 1,
            ..
        }
    ));
}

#[tokio::test]
async fn test_second_join_on_same_connection_is_an_error() {
    init_tracing();
    let (addr, service) = spawn_default_relay().await;

    let mut alice = TestClient::connect(addr).await.unwrap();
    alice.join("abc").await.unwrap();

    assert!(matches!(
        alice.join("def").await.unwrap(),
        ControlMessage::Error { .. }
    ));
    assert!(!service.registry().contains_session(&SessionId::from("def")));
}
