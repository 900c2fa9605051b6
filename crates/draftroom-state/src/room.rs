//! The draft room: authoritative state for one live draft.
//!
//! A [`DraftRoom`] is a handle around a single `tokio::sync::Mutex`. Every
//! operation (start, pick, pause, resume, timer expiry) takes the lock,
//! validates, mutates, re-arms or cancels the timer and emits its events
//! before releasing it. Events leave the room on bounded queues returned
//! in [`DraftStreams`]; the room never talks to connections, storage or
//! status collaborators directly.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use draftroom_protocol::{EventId, PlayerId, ServerMessage, UserId};
use draftroom_timer::PickTimer;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

use crate::{snake, DraftConfig, DraftError, DraftStatus, DraftSummary, PickResult, PickSelector};

/// Receiving ends of a room's output queues.
///
/// Whoever opens a room owns these and must keep draining `events` and
/// `picks`; a stalled consumer delays room operations by up to
/// [`DraftConfig::emit_timeout`] per message.
#[derive(Debug)]
pub struct DraftStreams {
    /// Ordered outgoing events, one per state change.
    pub events: mpsc::Receiver<ServerMessage>,
    /// One record per pick, manual or automatic, in pick order.
    pub picks: mpsc::Receiver<PickResult>,
    /// Fires once when the draft completes.
    pub completed: oneshot::Receiver<DraftSummary>,
}

/// A point-in-time view of a room, readable without the room lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSnapshot {
    pub event_id: EventId,
    pub status: DraftStatus,
    pub round_number: u32,
    pub current_turn: Option<UserId>,
    /// Number of picks made so far.
    pub current_pick_index: u32,
    pub total_rounds: u32,
    pub participants: usize,
    pub available_count: usize,
    /// Unix seconds; `None` unless a pick timer is running.
    pub turn_deadline: Option<i64>,
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

struct DraftState {
    status: DraftStatus,
    pick_order: Vec<UserId>,
    total_rounds: u32,
    /// Picks made so far; also the 0-based index of the next pick.
    pick_index: u32,
    round_number: u32,
    current_turn: Option<UserId>,
    available: Vec<PlayerId>,
    timer_duration: Duration,
    /// Budget saved by a pause, restored on resume.
    paused_remaining: Option<Duration>,
    timer: PickTimer,
    completion: Option<oneshot::Sender<DraftSummary>>,
    /// Set by [`DraftRoom::close`]; a closed room accepts nothing.
    closed: bool,
}

impl DraftState {
    fn new(available: Vec<PlayerId>, completion: oneshot::Sender<DraftSummary>) -> Self {
        Self {
            status: DraftStatus::NotStarted,
            pick_order: Vec::new(),
            total_rounds: 0,
            pick_index: 0,
            round_number: 0,
            current_turn: None,
            available,
            timer_duration: Duration::ZERO,
            paused_remaining: None,
            timer: PickTimer::new(),
            completion: Some(completion),
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<(), DraftError> {
        if self.closed {
            return Err(DraftError::InvalidState("draft room is closed".to_string()));
        }
        Ok(())
    }

    fn participants(&self) -> u32 {
        self.pick_order.len() as u32
    }

    /// Checked against overflow when the draft starts.
    fn total_picks(&self) -> u32 {
        self.participants() * self.total_rounds
    }

    fn pick_result(&self, event_id: EventId, user_id: UserId, player_id: PlayerId, auto_draft: bool) -> PickResult {
        PickResult {
            event_id,
            user_id,
            player_id,
            pick_number: self.pick_index + 1,
            round: self.round_number,
            auto_draft,
        }
    }

    fn snapshot(&self, event_id: EventId) -> RoomSnapshot {
        RoomSnapshot {
            event_id,
            status: self.status,
            round_number: self.round_number,
            current_turn: self.current_turn,
            current_pick_index: self.pick_index,
            total_rounds: self.total_rounds,
            participants: self.pick_order.len(),
            available_count: self.available.len(),
            turn_deadline: self.timer.deadline_unix(),
        }
    }
}

struct Shared {
    event_id: EventId,
    config: DraftConfig,
    selector: Arc<dyn PickSelector>,
    state: Mutex<DraftState>,
    events: mpsc::Sender<ServerMessage>,
    picks: mpsc::Sender<PickResult>,
    snapshot: RwLock<RoomSnapshot>,
}

// ---------------------------------------------------------------------------
// DraftRoom
// ---------------------------------------------------------------------------

/// Handle to one draft. Cheap to clone.
///
/// The pick timer task only holds a weak reference, so dropping every
/// handle tears the room down and aborts any pending expiry.
#[derive(Clone)]
pub struct DraftRoom {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for DraftRoom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftRoom")
            .field("event_id", &self.shared.event_id)
            .finish_non_exhaustive()
    }
}

impl DraftRoom {
    /// Creates a `NotStarted` room seeded with `pool`.
    pub fn open(
        event_id: EventId,
        pool: Vec<PlayerId>,
        config: DraftConfig,
        selector: Arc<dyn PickSelector>,
    ) -> (Self, DraftStreams) {
        let config = config.validated();
        let (event_tx, event_rx) = mpsc::channel(config.event_capacity);
        let (pick_tx, pick_rx) = mpsc::channel(config.pick_capacity);
        let (done_tx, done_rx) = oneshot::channel();

        let state = DraftState::new(dedup_pool(event_id, pool), done_tx);
        let snapshot = state.snapshot(event_id);
        info!(%event_id, available = state.available.len(), "draft room opened");

        let room = Self {
            shared: Arc::new(Shared {
                event_id,
                config,
                selector,
                state: Mutex::new(state),
                events: event_tx,
                picks: pick_tx,
                snapshot: RwLock::new(snapshot),
            }),
        };
        let streams = DraftStreams {
            events: event_rx,
            picks: pick_rx,
            completed: done_rx,
        };
        (room, streams)
    }

    pub fn event_id(&self) -> EventId {
        self.shared.event_id
    }

    /// Whether both handles refer to the same room.
    pub fn same_room(&self, other: &DraftRoom) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// The state as of the last completed operation.
    pub fn snapshot(&self) -> RoomSnapshot {
        self.shared.snapshot.read().clone()
    }

    /// Items not yet picked, in pool order.
    pub async fn available_players(&self) -> Vec<PlayerId> {
        self.shared.state.lock().await.available.clone()
    }

    /// Starts the draft with the given pick order.
    ///
    /// `available` replaces the room's pool. On success the first
    /// participant is on the clock and `draft_started` has been emitted.
    pub async fn start_draft(
        &self,
        pick_order: Vec<UserId>,
        total_rounds: u32,
        timer_duration: Duration,
        available: Vec<PlayerId>,
    ) -> Result<(), DraftError> {
        let shared = &self.shared;
        let mut state = shared.state.lock().await;
        state.ensure_open()?;
        if state.status != DraftStatus::NotStarted {
            return Err(DraftError::InvalidState(format!(
                "cannot start a draft that is {}",
                state.status
            )));
        }
        validate_start(&pick_order, total_rounds, timer_duration, &available)?;

        let first = pick_order[0];
        state.pick_order = pick_order;
        state.total_rounds = total_rounds;
        state.timer_duration = timer_duration;
        state.available = dedup_pool(shared.event_id, available);
        state.pick_index = 0;
        state.round_number = 1;
        state.current_turn = Some(first);
        state.status = DraftStatus::InProgress;
        shared.arm_timer(&mut state, timer_duration);

        info!(
            event_id = %shared.event_id,
            participants = state.pick_order.len(),
            total_rounds,
            timer_secs = timer_duration.as_secs(),
            "draft started"
        );
        shared.publish(&state);
        shared
            .emit(ServerMessage::DraftStarted {
                event_id: shared.event_id,
                current_turn: first,
                round_number: 1,
                turn_deadline: state.timer.deadline_unix().unwrap_or_default(),
            })
            .await;
        Ok(())
    }

    /// Records a manual pick by the participant on the clock.
    ///
    /// On any error the room is unchanged.
    pub async fn make_pick(
        &self,
        user_id: UserId,
        player_id: PlayerId,
    ) -> Result<PickResult, DraftError> {
        let shared = &self.shared;
        let mut state = shared.state.lock().await;
        state.ensure_open()?;
        if state.status != DraftStatus::InProgress {
            return Err(DraftError::NotInProgress(state.status));
        }
        let expected = state.current_turn.ok_or_else(|| {
            DraftError::InvalidState("no participant is on the clock".to_string())
        })?;
        if expected != user_id {
            return Err(DraftError::WrongTurn {
                expected,
                actual: user_id,
            });
        }
        let Some(idx) = state.available.iter().position(|p| *p == player_id) else {
            return Err(DraftError::ItemUnavailable(player_id));
        };

        state.timer.cancel();
        state.available.remove(idx);
        let pick = state.pick_result(shared.event_id, user_id, player_id, false);
        shared.commit_pick(&mut state, pick.clone()).await;
        Ok(pick)
    }

    /// Freezes the pick timer, keeping the rest of the budget for resume.
    pub async fn pause_draft(&self) -> Result<(), DraftError> {
        let shared = &self.shared;
        let mut state = shared.state.lock().await;
        state.ensure_open()?;
        if state.status != DraftStatus::InProgress {
            return Err(DraftError::InvalidState(format!(
                "cannot pause a draft that is {}",
                state.status
            )));
        }

        let remaining = state.timer.remaining().unwrap_or(state.timer_duration);
        state.timer.cancel();
        state.paused_remaining = Some(remaining);
        state.status = DraftStatus::Paused;

        info!(event_id = %shared.event_id, remaining_ms = remaining.as_millis() as u64, "draft paused");
        shared.publish(&state);
        shared
            .emit(ServerMessage::DraftPaused {
                event_id: shared.event_id,
                remaining_time: ceil_secs(remaining),
            })
            .await;
        Ok(())
    }

    /// Re-arms the timer with the budget saved at pause time.
    pub async fn resume_draft(&self) -> Result<(), DraftError> {
        let shared = &self.shared;
        let mut state = shared.state.lock().await;
        state.ensure_open()?;
        if state.status != DraftStatus::Paused {
            return Err(DraftError::InvalidState(format!(
                "cannot resume a draft that is {}",
                state.status
            )));
        }
        let current_turn = state.current_turn.ok_or_else(|| {
            DraftError::InvalidState("no participant is on the clock".to_string())
        })?;

        let remaining = state.paused_remaining.take().unwrap_or(state.timer_duration);
        state.status = DraftStatus::InProgress;
        shared.arm_timer(&mut state, remaining);

        info!(event_id = %shared.event_id, remaining_ms = remaining.as_millis() as u64, "draft resumed");
        shared.publish(&state);
        shared
            .emit(ServerMessage::DraftResumed {
                event_id: shared.event_id,
                current_turn,
                turn_deadline: state.timer.deadline_unix().unwrap_or_default(),
            })
            .await;
        Ok(())
    }

    /// Retires the room. The pending pick timer is cancelled and every
    /// later operation fails with [`DraftError::InvalidState`]. Used when
    /// the room is replaced.
    pub async fn close(&self) {
        let mut state = self.shared.state.lock().await;
        if state.closed {
            return;
        }
        state.closed = true;
        if state.timer.cancel() {
            debug!(event_id = %self.shared.event_id, "pick timer cancelled on close");
        }
        info!(event_id = %self.shared.event_id, status = %state.status, "draft room closed");
    }
}

// ---------------------------------------------------------------------------
// Transitions (all called with the state lock held)
// ---------------------------------------------------------------------------

impl Shared {
    fn arm_timer(self: &Arc<Self>, state: &mut DraftState, budget: Duration) {
        let room = Arc::downgrade(self);
        state.timer.arm(budget, move |generation| async move {
            if let Some(shared) = room.upgrade() {
                shared.on_timer_expired(generation).await;
            }
        });
    }

    async fn on_timer_expired(self: Arc<Self>, generation: u64) {
        let mut state = self.state.lock().await;
        if !state.timer.claim_expiry(generation) {
            debug!(event_id = %self.event_id, generation, "stale pick timer expiry ignored");
            return;
        }
        if state.closed || !state.status.is_active() {
            return;
        }
        let Some(user_id) = state.current_turn else {
            return;
        };

        if state.available.is_empty() {
            warn!(
                event_id = %self.event_id,
                picks = state.pick_index,
                "player pool exhausted, completing draft early"
            );
            self.complete(&mut state).await;
            return;
        }

        let idx = self
            .selector
            .choose(&state.available)
            .filter(|idx| *idx < state.available.len())
            .unwrap_or(0);
        let player_id = state.available.remove(idx);
        let pick = state.pick_result(self.event_id, user_id, player_id, true);
        self.commit_pick(&mut state, pick).await;
    }

    /// Emits and records an already-applied pick, then moves the turn on.
    async fn commit_pick(self: &Arc<Self>, state: &mut DraftState, pick: PickResult) {
        info!(
            event_id = %self.event_id,
            user_id = %pick.user_id,
            player_id = %pick.player_id,
            pick_number = pick.pick_number,
            round = pick.round,
            auto_draft = pick.auto_draft,
            "pick made"
        );
        self.emit(ServerMessage::PickMade {
            user_id: pick.user_id,
            player_id: pick.player_id,
            pick_number: pick.pick_number,
            round: pick.round,
            auto_draft: pick.auto_draft,
        })
        .await;
        self.record(pick).await;
        self.advance_turn(state).await;
    }

    async fn advance_turn(self: &Arc<Self>, state: &mut DraftState) {
        state.pick_index += 1;
        if state.pick_index >= state.total_picks() {
            self.complete(state).await;
            return;
        }

        let participants = state.participants();
        if state.pick_index >= participants * state.round_number {
            state.round_number += 1;
        }
        let position = snake::position(state.pick_index, participants, state.round_number);
        let next = state.pick_order[position];
        state.current_turn = Some(next);

        let budget = state.timer_duration;
        self.arm_timer(state, budget);

        debug!(event_id = %self.event_id, current_turn = %next, round = state.round_number, "turn changed");
        self.publish(state);
        self.emit(ServerMessage::TurnChanged {
            current_turn: next,
            round_number: state.round_number,
            turn_deadline: state.timer.deadline_unix().unwrap_or_default(),
        })
        .await;
    }

    async fn complete(&self, state: &mut DraftState) {
        state.timer.cancel();
        state.status = DraftStatus::Completed;
        state.current_turn = None;

        let summary = DraftSummary {
            event_id: self.event_id,
            total_picks: state.pick_index,
            total_rounds: state.total_rounds,
        };
        info!(
            event_id = %self.event_id,
            total_picks = summary.total_picks,
            total_rounds = summary.total_rounds,
            "draft completed"
        );
        self.publish(state);
        self.emit(ServerMessage::DraftCompleted {
            event_id: self.event_id,
            total_picks: summary.total_picks,
            total_rounds: summary.total_rounds,
        })
        .await;

        if let Some(done) = state.completion.take() {
            if done.send(summary).is_err() {
                debug!(event_id = %self.event_id, "nobody is waiting for draft completion");
            }
        }
    }

    fn publish(&self, state: &DraftState) {
        *self.snapshot.write() = state.snapshot(self.event_id);
    }

    async fn emit(&self, msg: ServerMessage) {
        let kind = msg.kind();
        match self.events.send_timeout(msg, self.config.emit_timeout).await {
            Ok(()) => {}
            Err(SendTimeoutError::Timeout(_)) => {
                warn!(event_id = %self.event_id, kind, "event queue full, dropping event");
            }
            Err(SendTimeoutError::Closed(_)) => {
                debug!(event_id = %self.event_id, kind, "event queue closed, dropping event");
            }
        }
    }

    async fn record(&self, pick: PickResult) {
        let pick_number = pick.pick_number;
        match self.picks.send_timeout(pick, self.config.emit_timeout).await {
            Ok(()) => {}
            Err(SendTimeoutError::Timeout(_)) => {
                warn!(event_id = %self.event_id, pick_number, "pick queue full, dropping pick record");
            }
            Err(SendTimeoutError::Closed(_)) => {
                debug!(event_id = %self.event_id, pick_number, "pick queue closed, dropping pick record");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_start(
    pick_order: &[UserId],
    total_rounds: u32,
    timer_duration: Duration,
    available: &[PlayerId],
) -> Result<(), DraftError> {
    let bad = |msg: String| Err(DraftError::BadParameters(msg));

    if pick_order.is_empty() {
        return bad("pick order is empty".to_string());
    }
    let mut seen = HashSet::with_capacity(pick_order.len());
    if let Some(dup) = pick_order.iter().find(|user| !seen.insert(**user)) {
        return bad(format!("{dup} appears more than once in the pick order"));
    }
    if available.is_empty() {
        return bad("no players available".to_string());
    }
    if total_rounds == 0 {
        return bad("total rounds must be at least 1".to_string());
    }
    if timer_duration.is_zero() {
        return bad("timer duration must be positive".to_string());
    }
    let fits = u32::try_from(pick_order.len())
        .ok()
        .and_then(|n| n.checked_mul(total_rounds))
        .is_some();
    if !fits {
        return bad("too many picks".to_string());
    }
    Ok(())
}

fn dedup_pool(event_id: EventId, pool: Vec<PlayerId>) -> Vec<PlayerId> {
    let before = pool.len();
    let mut seen = HashSet::with_capacity(before);
    let pool: Vec<PlayerId> = pool.into_iter().filter(|p| seen.insert(*p)).collect();
    if pool.len() != before {
        debug!(%event_id, dropped = before - pool.len(), "duplicate players removed from pool");
    }
    pool
}

/// Whole seconds, rounded up so a client never sees zero while time remains.
fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceil_secs() {
        assert_eq!(ceil_secs(Duration::ZERO), 0);
        assert_eq!(ceil_secs(Duration::from_secs(30)), 30);
        assert_eq!(ceil_secs(Duration::from_millis(29_001)), 30);
        assert_eq!(ceil_secs(Duration::from_millis(400)), 1);
    }

    #[test]
    fn test_validate_start() {
        let order = [UserId(1), UserId(2)];
        let pool = [PlayerId(10)];
        let secs = Duration::from_secs(30);
        assert!(validate_start(&order, 2, secs, &pool).is_ok());

        let kind = |r: Result<(), DraftError>| r.unwrap_err().kind();
        assert_eq!(kind(validate_start(&[], 2, secs, &pool)), "bad_parameters");
        assert_eq!(kind(validate_start(&order, 2, secs, &[])), "bad_parameters");
        assert_eq!(kind(validate_start(&order, 0, secs, &pool)), "bad_parameters");
        assert_eq!(kind(validate_start(&order, 2, Duration::ZERO, &pool)), "bad_parameters");
        assert_eq!(
            kind(validate_start(&[UserId(1), UserId(1)], 2, secs, &pool)),
            "bad_parameters"
        );
        assert_eq!(kind(validate_start(&order, u32::MAX, secs, &pool)), "bad_parameters");
    }

    #[test]
    fn test_dedup_pool_keeps_first_occurrence() {
        let pool = vec![PlayerId(3), PlayerId(1), PlayerId(3), PlayerId(2), PlayerId(1)];
        assert_eq!(
            dedup_pool(EventId(1), pool),
            vec![PlayerId(3), PlayerId(1), PlayerId(2)]
        );
    }
}
