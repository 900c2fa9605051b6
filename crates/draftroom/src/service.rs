//! `DraftService`: the orchestrator between connections, the active draft
//! room and the storage/status collaborators.
//!
//! The service owns at most one active [`DraftRoom`]. For each room it
//! spawns three bridge tasks that drain the room's output queues:
//!
//! - outgoing events → encoded once → [`Hub::broadcast`]
//! - pick records → [`PickStore::save_pick`]
//! - completion → [`EventStatusUpdater::update_status`] (`Completed`)
//!
//! The completion bridge is only spawned after the start has been reported
//! as `InProgress`, so the status collaborator sees the two updates in
//! order even when the draft finishes while the first is still pending.
//!
//! None of the bridges touch the room lock, so a slow collaborator can
//! hold up the room only as far as [`DraftConfig::emit_timeout`] allows.

use std::sync::Arc;
use std::time::Duration;

use draftroom_hub::Hub;
use draftroom_protocol::{ClientMessage, Codec, EventId, JsonCodec, PlayerId, ServerMessage};
use draftroom_state::{
    DraftConfig, DraftRoom, DraftStreams, DraftSummary, PickResult, PickSelector, RoomSnapshot,
};
use draftroom_transport::ConnectionId;
use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace};

use crate::store::{EventStatus, EventStatusUpdater, PickStore};
use crate::DraftroomError;

/// The room currently accepting commands, plus the bridges that must stop
/// when it is replaced.
struct ActiveRoom {
    room: DraftRoom,
    broadcaster: JoinHandle<()>,
    /// Taken by the completion bridge once the start is reported.
    completed: Option<oneshot::Receiver<DraftSummary>>,
    completion: Option<JoinHandle<()>>,
}

impl ActiveRoom {
    /// Stops forwarding the room's events and closes the room. The pick
    /// bridge is left to drain so no finished pick goes unrecorded.
    async fn retire(self) {
        self.broadcaster.abort();
        if let Some(completion) = self.completion {
            completion.abort();
        }
        self.room.close().await;
    }
}

/// Routes participant commands to the active room and fans its output out.
///
/// Shared by every connection task behind an `Arc`.
pub struct DraftService<S: PickStore, U: EventStatusUpdater> {
    hub: Hub,
    codec: JsonCodec,
    draft_config: DraftConfig,
    selector: Arc<dyn PickSelector>,
    store: Arc<S>,
    status: Arc<U>,
    active: RwLock<Option<ActiveRoom>>,
}

impl<S: PickStore, U: EventStatusUpdater> DraftService<S, U> {
    pub fn new(
        hub: Hub,
        draft_config: DraftConfig,
        selector: Arc<dyn PickSelector>,
        store: Arc<S>,
        status: Arc<U>,
    ) -> Self {
        Self {
            hub,
            codec: JsonCodec,
            draft_config,
            selector,
            store,
            status,
            active: RwLock::new(None),
        }
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Opens a fresh room for `event_id` and makes it the active one.
    ///
    /// Any previous room is retired: it is closed, so every later command
    /// on it fails, and its events are no longer broadcast.
    pub async fn create_room(&self, event_id: EventId, pool: Vec<PlayerId>) -> DraftRoom {
        let (room, streams) = DraftRoom::open(
            event_id,
            pool,
            self.draft_config.clone(),
            Arc::clone(&self.selector),
        );
        let DraftStreams {
            events,
            picks,
            completed,
        } = streams;

        let broadcaster = tokio::spawn(broadcast_events(
            self.hub.clone(),
            self.codec,
            event_id,
            events,
        ));
        tokio::spawn(persist_picks(Arc::clone(&self.store), event_id, picks));

        let previous = self.active.write().replace(ActiveRoom {
            room: room.clone(),
            broadcaster,
            completed: Some(completed),
            completion: None,
        });
        if let Some(previous) = previous {
            info!(
                replaced = %previous.room.event_id(),
                %event_id,
                "retiring previous draft room"
            );
            previous.retire().await;
        }

        info!(%event_id, "draft room created");
        room
    }

    /// The room currently accepting commands.
    pub fn active_room(&self) -> Option<DraftRoom> {
        self.active.read().as_ref().map(|active| active.room.clone())
    }

    /// Snapshot of the active room, if any.
    pub fn room_snapshot(&self) -> Option<RoomSnapshot> {
        self.active.read().as_ref().map(|active| active.room.snapshot())
    }

    /// Snapshot of the active room only if it belongs to `event_id`.
    pub fn room_snapshot_for(&self, event_id: EventId) -> Option<RoomSnapshot> {
        self.room_snapshot()
            .filter(|snapshot| snapshot.event_id == event_id)
    }

    /// Decodes and applies one inbound frame from `conn_id`.
    ///
    /// Failures are reported back to `conn_id` alone as an `error` message.
    /// Successful commands produce no direct reply; their effects arrive
    /// through the broadcast.
    pub async fn handle_inbound(&self, conn_id: ConnectionId, data: &[u8]) {
        if let Err(err) = self.dispatch(conn_id, data).await {
            debug!(%conn_id, kind = err.kind(), error = %err, "command rejected");
            self.reply_error(conn_id, &err);
        }
    }

    async fn dispatch(&self, conn_id: ConnectionId, data: &[u8]) -> Result<(), DraftroomError> {
        let msg = ClientMessage::decode_frame(&self.codec, data)?;
        let room = self.active_room().ok_or(DraftroomError::NoActiveRoom)?;
        debug!(%conn_id, event_id = %room.event_id(), kind = msg.kind(), "command received");

        match msg {
            ClientMessage::StartDraft {
                pick_order,
                total_rounds,
                timer_duration,
            } => {
                let pool = room.available_players().await;
                room.start_draft(
                    pick_order,
                    total_rounds,
                    Duration::from_secs(timer_duration),
                    pool,
                )
                .await?;
                report_status(&*self.status, room.event_id(), EventStatus::InProgress).await;
                self.watch_completion(&room);
            }
            ClientMessage::MakePick { user_id, player_id } => {
                room.make_pick(user_id, player_id).await?;
            }
            ClientMessage::PauseDraft {} => room.pause_draft().await?,
            ClientMessage::ResumeDraft {} => room.resume_draft().await?,
        }
        Ok(())
    }

    /// Spawns the completion bridge for `room` if it is still the active one.
    fn watch_completion(&self, room: &DraftRoom) {
        let mut guard = self.active.write();
        let Some(active) = guard.as_mut().filter(|active| active.room.same_room(room)) else {
            debug!(event_id = %room.event_id(), "room retired before its start was reported");
            return;
        };
        if let Some(completed) = active.completed.take() {
            active.completion = Some(tokio::spawn(report_completion(
                Arc::clone(&self.status),
                completed,
            )));
        }
    }

    fn reply_error(&self, conn_id: ConnectionId, err: &DraftroomError) {
        let bytes = match self.codec.encode(&ServerMessage::error(err.to_string())) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(%conn_id, error = %e, "failed to encode error reply");
                return;
            }
        };
        if let Err(e) = self.hub.send_to(conn_id, bytes) {
            debug!(%conn_id, error = %e, "error reply not delivered");
        }
    }
}

// ---------------------------------------------------------------------------
// Bridges
// ---------------------------------------------------------------------------

async fn broadcast_events(
    hub: Hub,
    codec: JsonCodec,
    event_id: EventId,
    mut events: mpsc::Receiver<ServerMessage>,
) {
    while let Some(msg) = events.recv().await {
        let bytes = match codec.encode(&msg) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(%event_id, kind = msg.kind(), error = %e, "failed to encode event");
                continue;
            }
        };
        let report = hub.broadcast(bytes);
        trace!(
            %event_id,
            kind = msg.kind(),
            delivered = report.delivered,
            dropped = report.dropped,
            "event broadcast"
        );
    }
    debug!(%event_id, "event stream ended");
}

async fn persist_picks<S: PickStore>(
    store: Arc<S>,
    event_id: EventId,
    mut picks: mpsc::Receiver<PickResult>,
) {
    while let Some(pick) = picks.recv().await {
        if let Err(e) = store.save_pick(&pick).await {
            error!(
                %event_id,
                pick_number = pick.pick_number,
                user_id = %pick.user_id,
                player_id = %pick.player_id,
                error = %e,
                "failed to save pick"
            );
        }
    }
    debug!(%event_id, "pick stream ended");
}

async fn report_completion<U: EventStatusUpdater>(
    status: Arc<U>,
    completed: oneshot::Receiver<DraftSummary>,
) {
    // A dropped sender means the room went away unfinished.
    if let Ok(summary) = completed.await {
        report_status(&*status, summary.event_id, EventStatus::Completed).await;
    }
}

async fn report_status<U: EventStatusUpdater>(status: &U, event_id: EventId, new_status: EventStatus) {
    match status.update_status(event_id, new_status).await {
        Ok(()) => debug!(%event_id, status = %new_status, "event status updated"),
        Err(e) => error!(%event_id, status = %new_status, error = %e, "failed to update event status"),
    }
}
