/*!
 * Integration tests for two peers syncing over an in-memory channel
 */

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

use subedit::cue::CueField;
use subedit::cue_store::CueStore;
use subedit::sync::{ConnectionState, MemoryChannel, SessionRole, StoreEdit, SyncSession};
use crate::common;

const DEBOUNCE: Duration = Duration::from_millis(20);
const SETTLE: Duration = Duration::from_millis(200);
const DEADLINE: Duration = Duration::from_secs(5);

fn edit_text(index: usize, text: &str) -> StoreEdit {
    let text = text.to_string();
    Box::new(move |store: &mut CueStore| store.set_field(index, CueField::Text(text)))
}

/// Test that the guest receives the host's document and both sides see each other's edits
#[tokio::test]
async fn test_collaboration_withEditsOnBothSides_shouldConverge() {
    common::init_test_logging();

    let (host_end, guest_end) = MemoryChannel::pair();
    let (host_edits, host_queue) = mpsc::unbounded_channel::<StoreEdit>();
    let (guest_edits, guest_queue) = mpsc::unbounded_channel::<StoreEdit>();

    let host_task = tokio::spawn(async move {
        let mut session = SyncSession::connect(SessionRole::Host, host_end, DEBOUNCE);
        let mut store = CueStore::from_cues(common::sample_cues());
        let state = session.run(&mut store, host_queue).await;
        (session, store, state)
    });

    let guest_task = tokio::spawn(async move {
        let mut session = SyncSession::connect(SessionRole::Guest, guest_end, DEBOUNCE);
        let mut store = CueStore::new();
        let state = session.run(&mut store, guest_queue).await;
        (store, state)
    });

    sleep(SETTLE).await;
    host_edits.send(edit_text(0, "Edited by host")).unwrap();
    sleep(SETTLE).await;
    guest_edits.send(edit_text(2, "Edited by guest")).unwrap();
    sleep(SETTLE).await;

    // Closing the host's edit queue ends its loop; dropping its session closes the channel
    drop(host_edits);
    let (host_session, host_store, host_state) = timeout(DEADLINE, host_task).await.unwrap().unwrap();
    assert_eq!(host_state, ConnectionState::Connected);
    drop(host_session);

    let (guest_store, guest_state) = timeout(DEADLINE, guest_task).await.unwrap().unwrap();
    assert_eq!(guest_state, ConnectionState::Disconnected);
    drop(guest_edits);

    assert_eq!(host_store.cues()[0].text, "Edited by host");
    assert_eq!(host_store.cues()[2].text, "Edited by guest");
    assert_eq!(guest_store.cues(), host_store.cues());
}

/// Test that rapid edits are coalesced and the final state still arrives
#[tokio::test]
async fn test_collaboration_withBurstOfEdits_shouldDeliverLastState() {
    let (host_end, guest_end) = MemoryChannel::pair();
    let (host_edits, host_queue) = mpsc::unbounded_channel::<StoreEdit>();
    let (_guest_edits, guest_queue) = mpsc::unbounded_channel::<StoreEdit>();

    let host_task = tokio::spawn(async move {
        let mut session = SyncSession::connect(SessionRole::Host, host_end, DEBOUNCE);
        let mut store = CueStore::from_cues(common::sample_cues());
        session.run(&mut store, host_queue).await;
        (session, store)
    });

    let guest_task = tokio::spawn(async move {
        let mut session = SyncSession::connect(SessionRole::Guest, guest_end, DEBOUNCE);
        let mut store = CueStore::new();
        session.run(&mut store, guest_queue).await;
        store
    });

    sleep(SETTLE).await;
    for i in 0..10 {
        host_edits.send(edit_text(1, &format!("draft {}", i))).unwrap();
    }
    drop(host_edits);

    let (host_session, host_store) = timeout(DEADLINE, host_task).await.unwrap().unwrap();
    drop(host_session);
    let guest_store = timeout(DEADLINE, guest_task).await.unwrap().unwrap();

    assert_eq!(host_store.cues()[1].text, "draft 9");
    assert_eq!(guest_store.cues(), host_store.cues());
}

/// Test that a guest whose host never answers stays disconnected after close
#[tokio::test]
async fn test_collaboration_withPeerGone_shouldDisconnect() {
    let (guest_end, host_end) = MemoryChannel::pair();
    drop(host_end);
    let (_edits, queue) = mpsc::unbounded_channel::<StoreEdit>();

    let mut session = SyncSession::connect(SessionRole::Guest, guest_end, DEBOUNCE);
    let mut store = CueStore::new();
    let state = timeout(DEADLINE, session.run(&mut store, queue)).await.unwrap();

    assert_eq!(state, ConnectionState::Disconnected);
    assert!(store.is_empty());
}
