//! Collaborator hooks for persistence and event status.
//!
//! The engine does not own storage. It hands every pick to a [`PickStore`]
//! and reports lifecycle changes to an [`EventStatusUpdater`]; both are
//! best-effort from the draft's point of view, so a failure is logged and
//! the draft carries on.
//!
//! [`InMemoryStore`] implements both for the demo server and for tests.

use std::collections::HashMap;
use std::future::Future;

use chrono::{DateTime, Utc};
use draftroom_protocol::{EventId, PlayerId, UserId};
use draftroom_state::PickResult;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Errors returned by collaborator implementations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A pick with this number was already saved for the event.
    #[error("pick {pick_number} already recorded for event {event_id}")]
    Duplicate { event_id: EventId, pick_number: u32 },

    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Lifecycle of an event as seen by the rest of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Persists completed picks.
///
/// Called from a dedicated task in pick order, never while the draft
/// lock is held.
///
/// ```rust
/// use draftroom::{PickResult, PickStore, StoreError};
///
/// struct LogStore;
///
/// impl PickStore for LogStore {
///     async fn save_pick(&self, pick: &PickResult) -> Result<(), StoreError> {
///         println!("pick {} -> {}", pick.pick_number, pick.player_id);
///         Ok(())
///     }
/// }
/// ```
pub trait PickStore: Send + Sync + 'static {
    fn save_pick(
        &self,
        pick: &PickResult,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Receives event status transitions.
pub trait EventStatusUpdater: Send + Sync + 'static {
    fn update_status(
        &self,
        event_id: EventId,
        status: EventStatus,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

// ---------------------------------------------------------------------------
// InMemoryStore
// ---------------------------------------------------------------------------

/// A pick as stored, with the time it was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPick {
    pub event_id: EventId,
    pub user_id: UserId,
    pub player_id: PlayerId,
    pub pick_number: u32,
    pub round: u32,
    pub auto_draft: bool,
    pub recorded_at: DateTime<Utc>,
}

/// Process-local implementation of both collaborator traits.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    picks: RwLock<HashMap<EventId, Vec<StoredPick>>>,
    statuses: RwLock<HashMap<EventId, Vec<EventStatus>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All picks for an event, ordered by pick number.
    pub fn picks_for_event(&self, event_id: EventId) -> Vec<StoredPick> {
        self.picks.read().get(&event_id).cloned().unwrap_or_default()
    }

    /// One participant's picks for an event, ordered by pick number.
    pub fn picks_for_user(&self, event_id: EventId, user_id: UserId) -> Vec<StoredPick> {
        self.picks
            .read()
            .get(&event_id)
            .map(|picks| {
                picks
                    .iter()
                    .filter(|p| p.user_id == user_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The most recent status reported for an event.
    pub fn status(&self, event_id: EventId) -> Option<EventStatus> {
        self.statuses
            .read()
            .get(&event_id)
            .and_then(|history| history.last().copied())
    }

    /// Every status reported for an event, oldest first.
    pub fn status_history(&self, event_id: EventId) -> Vec<EventStatus> {
        self.statuses
            .read()
            .get(&event_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl PickStore for InMemoryStore {
    async fn save_pick(&self, pick: &PickResult) -> Result<(), StoreError> {
        let mut picks = self.picks.write();
        let event = picks.entry(pick.event_id).or_default();
        let slot = match event.binary_search_by_key(&pick.pick_number, |p| p.pick_number) {
            Ok(_) => {
                return Err(StoreError::Duplicate {
                    event_id: pick.event_id,
                    pick_number: pick.pick_number,
                });
            }
            Err(slot) => slot,
        };
        event.insert(
            slot,
            StoredPick {
                event_id: pick.event_id,
                user_id: pick.user_id,
                player_id: pick.player_id,
                pick_number: pick.pick_number,
                round: pick.round,
                auto_draft: pick.auto_draft,
                recorded_at: Utc::now(),
            },
        );
        Ok(())
    }
}

impl EventStatusUpdater for InMemoryStore {
    async fn update_status(&self, event_id: EventId, status: EventStatus) -> Result<(), StoreError> {
        self.statuses.write().entry(event_id).or_default().push(status);
        Ok(())
    }
}
