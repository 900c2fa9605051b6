//! Orchestrator tests that drive `DraftService` directly through hub
//! queues, without sockets.

use std::sync::Arc;
use std::time::Duration;

use draftroom::prelude::*;
use draftroom_hub::{Frame, Hub};
use draftroom_transport::ConnectionId;
use serde_json::json;
use tokio::sync::mpsc;

type Service = DraftService<InMemoryStore, InMemoryStore>;

const EVENT: EventId = EventId(42);

// =========================================================================
// Helpers
// =========================================================================

fn service() -> (Arc<Service>, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let service = DraftService::new(
        Hub::new(HubConfig::default()),
        DraftConfig::default(),
        Arc::new(FirstAvailable),
        Arc::clone(&store),
        Arc::clone(&store),
    );
    (Arc::new(service), store)
}

fn connect(service: &Service, id: u64) -> (ConnectionId, mpsc::Receiver<Frame>) {
    let conn_id = ConnectionId::new(id);
    let rx = service.hub().register(conn_id).unwrap();
    (conn_id, rx)
}

async fn send(service: &Service, conn_id: ConnectionId, value: serde_json::Value) {
    let bytes = serde_json::to_vec(&value).unwrap();
    service.handle_inbound(conn_id, &bytes).await;
}

async fn next(rx: &mut mpsc::Receiver<Frame>) -> ServerMessage {
    let frame = tokio::time::timeout(Duration::from_secs(30), rx.recv())
        .await
        .expect("timed out waiting for a frame")
        .expect("queue closed");
    serde_json::from_slice(&frame).expect("frame should decode")
}

fn assert_quiet(rx: &mut mpsc::Receiver<Frame>) {
    assert!(rx.try_recv().is_err(), "expected no pending frames");
}

/// Polls `check` until it holds; collaborator bridges run on their own tasks.
async fn eventually(mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition never became true");
}

fn start_msg(order: &[u64], rounds: u32, timer: u64) -> serde_json::Value {
    json!({
        "type": "start_draft",
        "pickOrder": order,
        "totalRounds": rounds,
        "timerDuration": timer,
    })
}

fn pick_msg(user: u64, player: u64) -> serde_json::Value {
    json!({ "type": "make_pick", "userID": user, "playerID": player })
}

fn error_text(msg: ServerMessage) -> String {
    match msg {
        ServerMessage::Error { error } => error,
        other => panic!("expected error, got {other:?}"),
    }
}

// =========================================================================
// Errors stay with the sender
// =========================================================================

#[tokio::test]
async fn test_command_without_room_is_rejected() {
    let (service, _store) = service();
    let (a, mut rx_a) = connect(&service, 1);
    let (_b, mut rx_b) = connect(&service, 2);

    send(&service, a, json!({ "type": "pause_draft" })).await;

    assert_eq!(error_text(next(&mut rx_a).await), "no active draft room");
    assert_quiet(&mut rx_b);
    assert!(service.room_snapshot().is_none());
}

#[tokio::test]
async fn test_malformed_frames_get_error_replies() {
    let (service, _store) = service();
    service.create_room(EVENT, (1..=4).map(PlayerId).collect()).await;
    let (a, mut rx_a) = connect(&service, 1);

    service.handle_inbound(a, b"not json").await;
    assert!(error_text(next(&mut rx_a).await).starts_with("invalid message format"));

    send(&service, a, json!({ "type": "trade_players" })).await;
    assert_eq!(
        error_text(next(&mut rx_a).await),
        "unknown message type: trade_players"
    );

    send(&service, a, json!({ "type": "make_pick", "userID": 1 })).await;
    assert!(error_text(next(&mut rx_a).await).starts_with("invalid message format"));

    let oversized = vec![b' '; 40 * 1024];
    service.handle_inbound(a, &oversized).await;
    assert!(error_text(next(&mut rx_a).await).starts_with("message too large"));

    assert_eq!(
        service.room_snapshot().unwrap().status,
        DraftStatus::NotStarted
    );
}

#[tokio::test]
async fn test_wrong_turn_error_goes_only_to_sender() {
    let (service, _store) = service();
    service.create_room(EVENT, (1..=4).map(PlayerId).collect()).await;
    let (a, mut rx_a) = connect(&service, 1);
    let (b, mut rx_b) = connect(&service, 2);

    send(&service, a, start_msg(&[10, 20], 2, 60)).await;
    assert!(matches!(next(&mut rx_a).await, ServerMessage::DraftStarted { .. }));
    assert!(matches!(next(&mut rx_b).await, ServerMessage::DraftStarted { .. }));

    send(&service, b, pick_msg(20, 1)).await;
    assert_eq!(error_text(next(&mut rx_b).await), "not your turn: waiting on U-10");
    assert_quiet(&mut rx_a);
}

// =========================================================================
// Broadcast and collaborators
// =========================================================================

#[tokio::test]
async fn test_full_draft_is_broadcast_and_persisted() {
    let (service, store) = service();
    service.create_room(EVENT, (1..=4).map(PlayerId).collect()).await;
    let (a, mut rx_a) = connect(&service, 1);
    let (_b, mut rx_b) = connect(&service, 2);

    send(&service, a, start_msg(&[10, 20], 2, 60)).await;
    for (user, player) in [(10, 1), (20, 2), (20, 3), (10, 4)] {
        send(&service, a, pick_msg(user, player)).await;
    }

    // Both connections see the same ordered stream.
    for rx in [&mut rx_a, &mut rx_b] {
        let mut kinds = Vec::new();
        loop {
            let msg = next(rx).await;
            kinds.push(msg.kind());
            if matches!(msg, ServerMessage::DraftCompleted { .. }) {
                break;
            }
        }
        assert_eq!(
            kinds,
            [
                "draft_started",
                "pick_made",
                "turn_changed",
                "pick_made",
                "turn_changed",
                "pick_made",
                "turn_changed",
                "pick_made",
                "draft_completed",
            ]
        );
    }

    eventually(|| store.picks_for_event(EVENT).len() == 4).await;
    let users: Vec<u64> = store
        .picks_for_event(EVENT)
        .iter()
        .map(|p| p.user_id.0)
        .collect();
    assert_eq!(users, [10, 20, 20, 10]);
    assert_eq!(store.picks_for_user(EVENT, UserId(20)).len(), 2);

    eventually(|| store.status(EVENT) == Some(EventStatus::Completed)).await;
    assert_eq!(
        store.status_history(EVENT),
        [EventStatus::InProgress, EventStatus::Completed]
    );
    assert_eq!(service.room_snapshot().unwrap().status, DraftStatus::Completed);
}

/// Holds the `InProgress` report back so the draft can finish first.
struct SlowStart(Arc<InMemoryStore>);

impl EventStatusUpdater for SlowStart {
    async fn update_status(&self, event_id: EventId, status: EventStatus) -> Result<(), StoreError> {
        if status == EventStatus::InProgress {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        self.0.update_status(event_id, status).await
    }
}

#[tokio::test(start_paused = true)]
async fn test_completion_is_reported_after_a_slow_start() {
    let store = Arc::new(InMemoryStore::new());
    let service = Arc::new(DraftService::new(
        Hub::new(HubConfig::default()),
        DraftConfig::default(),
        Arc::new(FirstAvailable),
        Arc::clone(&store),
        Arc::new(SlowStart(Arc::clone(&store))),
    ));
    service.create_room(EVENT, vec![PlayerId(1)]).await;
    let (a, b) = (ConnectionId::new(1), ConnectionId::new(2));
    let _rx_a = service.hub().register(a).unwrap();
    let _rx_b = service.hub().register(b).unwrap();

    let starter = tokio::spawn({
        let service = Arc::clone(&service);
        let bytes = serde_json::to_vec(&start_msg(&[7], 1, 60)).unwrap();
        async move { service.handle_inbound(a, &bytes).await }
    });
    eventually(|| {
        service
            .room_snapshot()
            .is_some_and(|snap| snap.status == DraftStatus::InProgress)
    })
    .await;

    // The only pick finishes the draft while the start is still reporting.
    let pick = serde_json::to_vec(&pick_msg(7, 1)).unwrap();
    service.handle_inbound(b, &pick).await;
    assert_eq!(service.room_snapshot().unwrap().status, DraftStatus::Completed);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(store.status_history(EVENT).is_empty());

    starter.await.unwrap();
    eventually(|| store.status_history(EVENT).len() == 2).await;
    assert_eq!(
        store.status_history(EVENT),
        [EventStatus::InProgress, EventStatus::Completed]
    );
}

#[tokio::test]
async fn test_failed_start_reports_no_status() {
    let (service, store) = service();
    service.create_room(EVENT, (1..=4).map(PlayerId).collect()).await;
    let (a, mut rx_a) = connect(&service, 1);

    send(&service, a, start_msg(&[], 2, 60)).await;
    assert!(error_text(next(&mut rx_a).await).starts_with("bad draft parameters"));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(store.status_history(EVENT).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_timer_expiry_auto_drafts_through_the_service() {
    let (service, store) = service();
    service.create_room(EVENT, vec![PlayerId(7), PlayerId(8)]).await;
    let (a, mut rx_a) = connect(&service, 1);

    send(&service, a, start_msg(&[10, 20], 1, 5)).await;
    assert!(matches!(next(&mut rx_a).await, ServerMessage::DraftStarted { .. }));

    assert_eq!(
        next(&mut rx_a).await,
        ServerMessage::PickMade {
            user_id: UserId(10),
            player_id: PlayerId(7),
            pick_number: 1,
            round: 1,
            auto_draft: true,
        }
    );
    assert!(matches!(
        next(&mut rx_a).await,
        ServerMessage::TurnChanged {
            current_turn: UserId(20),
            ..
        }
    ));

    eventually(|| store.picks_for_event(EVENT).len() == 1).await;
    assert!(store.picks_for_event(EVENT)[0].auto_draft);
}

#[tokio::test]
async fn test_pause_and_resume_are_broadcast() {
    let (service, _store) = service();
    service.create_room(EVENT, (1..=4).map(PlayerId).collect()).await;
    let (a, mut rx_a) = connect(&service, 1);

    send(&service, a, start_msg(&[10, 20], 2, 60)).await;
    next(&mut rx_a).await;

    send(&service, a, json!({ "type": "pause_draft" })).await;
    match next(&mut rx_a).await {
        ServerMessage::DraftPaused {
            event_id,
            remaining_time,
        } => {
            assert_eq!(event_id, EVENT);
            assert!(remaining_time > 0 && remaining_time <= 60);
        }
        other => panic!("expected draft_paused, got {other:?}"),
    }

    send(&service, a, json!({ "type": "pause_draft" })).await;
    assert!(error_text(next(&mut rx_a).await).starts_with("invalid draft state"));

    send(&service, a, json!({ "type": "resume_draft" })).await;
    assert!(matches!(
        next(&mut rx_a).await,
        ServerMessage::DraftResumed {
            current_turn: UserId(10),
            ..
        }
    ));
}

// =========================================================================
// Room lifecycle
// =========================================================================

#[tokio::test]
async fn test_create_room_replaces_previous() {
    let (service, _store) = service();
    let old = service.create_room(EventId(1), (1..=4).map(PlayerId).collect()).await;
    let (_a, mut rx_a) = connect(&service, 1);

    service.create_room(EventId(2), (5..=8).map(PlayerId).collect()).await;

    assert!(service.room_snapshot_for(EventId(1)).is_none());
    let snap = service.room_snapshot_for(EventId(2)).unwrap();
    assert_eq!(snap.status, DraftStatus::NotStarted);
    assert_eq!(snap.available_count, 4);

    // The retired room is closed for good.
    let pool = old.available_players().await;
    let err = old
        .start_draft(vec![UserId(1)], 1, Duration::from_secs(60), pool)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "invalid_state");
    assert_eq!(old.snapshot().status, DraftStatus::NotStarted);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_quiet(&mut rx_a);
}

#[tokio::test(start_paused = true)]
async fn test_replaced_room_stops_drafting() {
    let (service, store) = service();
    let old = service.create_room(EventId(1), (1..=4).map(PlayerId).collect()).await;
    let (a, mut rx_a) = connect(&service, 1);

    send(&service, a, start_msg(&[10, 20], 2, 5)).await;
    assert!(matches!(next(&mut rx_a).await, ServerMessage::DraftStarted { .. }));

    service.create_room(EventId(2), (5..=8).map(PlayerId).collect()).await;
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_quiet(&mut rx_a);
    assert!(store.picks_for_event(EventId(1)).is_empty());
    assert_eq!(old.snapshot().current_pick_index, 0);
    assert_eq!(
        old.make_pick(UserId(10), PlayerId(1)).await.unwrap_err().kind(),
        "invalid_state"
    );
    assert_eq!(store.status_history(EventId(1)), [EventStatus::InProgress]);
}

#[tokio::test]
async fn test_room_snapshot_tracks_progress() {
    let (service, _store) = service();
    service.create_room(EVENT, (1..=6).map(PlayerId).collect()).await;
    let (a, mut rx_a) = connect(&service, 1);

    send(&service, a, start_msg(&[10, 20, 30], 2, 60)).await;
    send(&service, a, pick_msg(10, 3)).await;
    next(&mut rx_a).await;

    let snap = service.room_snapshot_for(EVENT).unwrap();
    assert_eq!(snap.status, DraftStatus::InProgress);
    assert_eq!(snap.current_turn, Some(UserId(20)));
    assert_eq!(snap.current_pick_index, 1);
    assert_eq!(snap.round_number, 1);
    assert_eq!(snap.available_count, 5);
    assert_eq!(snap.participants, 3);
}
