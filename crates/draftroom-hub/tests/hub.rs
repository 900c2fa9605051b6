//! Integration tests for the broadcast hub.

use draftroom_hub::{BroadcastReport, Hub, HubConfig, HubError};
use draftroom_transport::ConnectionId;

fn cid(id: u64) -> ConnectionId {
    ConnectionId::new(id)
}

fn frame(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}

fn hub_with_capacity(outbound_capacity: usize) -> Hub {
    Hub::new(HubConfig { outbound_capacity })
}

// =========================================================================
// Registration
// =========================================================================

#[tokio::test]
async fn test_register_and_unregister() {
    let hub = Hub::default();
    let _rx = hub.register(cid(1)).unwrap();
    assert!(hub.is_registered(cid(1)));
    assert_eq!(hub.connection_count(), 1);

    assert!(hub.unregister(cid(1)));
    assert!(!hub.is_registered(cid(1)));
    assert!(!hub.unregister(cid(1)), "second unregister is a no-op");
}

#[tokio::test]
async fn test_register_twice_is_rejected() {
    let hub = Hub::default();
    let _rx = hub.register(cid(1)).unwrap();
    assert_eq!(hub.register(cid(1)).unwrap_err(), HubError::AlreadyRegistered(cid(1)));
}

// =========================================================================
// Broadcast
// =========================================================================

#[tokio::test]
async fn test_broadcast_reaches_every_connection() {
    let hub = Hub::default();
    let mut a = hub.register(cid(1)).unwrap();
    let mut b = hub.register(cid(2)).unwrap();

    let report = hub.broadcast(frame("draft_started"));
    assert_eq!(report, BroadcastReport { delivered: 2, dropped: 0 });

    assert_eq!(&*a.recv().await.unwrap(), b"draft_started");
    assert_eq!(&*b.recv().await.unwrap(), b"draft_started");
}

#[tokio::test]
async fn test_broadcast_preserves_per_connection_order() {
    let hub = Hub::default();
    let mut rx = hub.register(cid(1)).unwrap();

    for i in 0..10 {
        hub.broadcast(frame(&format!("msg-{i}")));
    }
    for i in 0..10 {
        let got = rx.recv().await.unwrap();
        assert_eq!(&*got, format!("msg-{i}").as_bytes());
    }
}

#[tokio::test]
async fn test_unregistered_connection_gets_nothing() {
    let hub = Hub::default();
    let mut rx = hub.register(cid(1)).unwrap();
    hub.unregister(cid(1));

    let report = hub.broadcast(frame("pick_made"));
    assert_eq!(report.delivered, 0);
    assert!(rx.recv().await.is_none(), "queue closes once unregistered");
}

#[tokio::test]
async fn test_full_queue_drops_only_the_slow_connection() {
    let hub = hub_with_capacity(2);
    let mut fast = hub.register(cid(1)).unwrap();
    let _slow = hub.register(cid(2)).unwrap(); // never drained

    for i in 0..2 {
        hub.broadcast(frame(&format!("m{i}")));
        fast.recv().await.unwrap();
    }

    // The slow queue is now full; the next broadcast evicts it.
    let report = hub.broadcast(frame("m2"));
    assert_eq!(report, BroadcastReport { delivered: 1, dropped: 1 });
    assert!(!hub.is_registered(cid(2)));
    assert!(hub.is_registered(cid(1)));
    assert_eq!(&*fast.recv().await.unwrap(), b"m2");

    let report = hub.broadcast(frame("m3"));
    assert_eq!(report, BroadcastReport { delivered: 1, dropped: 0 });
}

#[tokio::test]
async fn test_closed_receiver_is_pruned_on_broadcast() {
    let hub = Hub::default();
    let rx = hub.register(cid(1)).unwrap();
    drop(rx);

    let report = hub.broadcast(frame("turn_changed"));
    assert_eq!(report, BroadcastReport { delivered: 0, dropped: 1 });
    assert_eq!(hub.connection_count(), 0);
}

// =========================================================================
// Direct replies
// =========================================================================

#[tokio::test]
async fn test_send_to_targets_one_connection() {
    let hub = Hub::default();
    let mut a = hub.register(cid(1)).unwrap();
    let mut b = hub.register(cid(2)).unwrap();

    hub.send_to(cid(2), frame("error")).unwrap();
    hub.broadcast(frame("after"));

    assert_eq!(&*a.recv().await.unwrap(), b"after");
    assert_eq!(&*b.recv().await.unwrap(), b"error");
    assert_eq!(&*b.recv().await.unwrap(), b"after");
}

#[tokio::test]
async fn test_send_to_unknown_connection() {
    let hub = Hub::default();
    assert_eq!(hub.send_to(cid(9), frame("x")).unwrap_err(), HubError::NotRegistered(cid(9)));
}

#[tokio::test]
async fn test_send_to_full_queue_disconnects() {
    let hub = hub_with_capacity(1);
    let _rx = hub.register(cid(1)).unwrap();
    hub.send_to(cid(1), frame("first")).unwrap();

    assert_eq!(hub.send_to(cid(1), frame("second")).unwrap_err(), HubError::QueueFull(cid(1)));
    assert!(!hub.is_registered(cid(1)));
}

#[tokio::test]
async fn test_concurrent_register_and_broadcast() {
    let hub = Hub::default();
    let mut handles = Vec::new();
    for i in 0..16 {
        let hub = hub.clone();
        handles.push(tokio::spawn(async move {
            let mut rx = hub.register(cid(i)).unwrap();
            hub.broadcast(frame(&format!("from-{i}")));
            // Our own frame is always in our queue.
            let mut seen = false;
            while let Ok(f) = rx.try_recv() {
                if &*f == format!("from-{i}").as_bytes() {
                    seen = true;
                }
            }
            seen
        }));
    }
    for h in handles {
        assert!(h.await.unwrap());
    }
    assert_eq!(hub.connection_count(), 16);
}
