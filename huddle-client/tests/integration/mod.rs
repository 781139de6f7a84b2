pub mod room_tests;

use huddle_client::{ClientEvent, ClientHandle};
use std::time::Duration;

/// Wait for the first event matching `predicate`, skipping others.
pub async fn expect_event<F>(handle: &mut ClientHandle, predicate: F) -> ClientEvent
where
    F: Fn(&ClientEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match handle.next_event().await {
                Some(event) if predicate(&event) => return event,
                Some(_) => continue,
                None => panic!("client stopped before the expected event"),
            }
        }
    })
    .await
    .expect("Timeout waiting for client event")
}

pub async fn identity_of(handle: &mut ClientHandle) -> huddle_core::ParticipantId {
    match expect_event(handle, |e| matches!(e, ClientEvent::Identity(_))).await {
        ClientEvent::Identity(id) => id,
        _ => unreachable!(),
    }
}
