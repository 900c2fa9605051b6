//! Draft configuration and lifecycle state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DraftConfig
// ---------------------------------------------------------------------------

/// Queue sizing and backpressure for one draft room.
///
/// The room emits onto two bounded queues: outgoing events (broadcast to
/// every connection) and pick records (handed to persistence). When a
/// queue is full the producer waits up to `emit_timeout` while still
/// holding the room lock, then drops the message with a warning. The
/// queues are drained by tasks that never take the room lock, so the wait
/// cannot deadlock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftConfig {
    /// Capacity of the outgoing-event queue.
    pub event_capacity: usize,

    /// Capacity of the pick-record queue.
    pub pick_capacity: usize,

    /// How long a full queue may hold up the producer.
    pub emit_timeout: Duration,
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            event_capacity: 256,
            pick_capacity: 256,
            emit_timeout: Duration::from_secs(1),
        }
    }
}

impl DraftConfig {
    /// Forces both capacities to at least 1.
    pub fn validated(mut self) -> Self {
        self.event_capacity = self.event_capacity.max(1);
        self.pick_capacity = self.pick_capacity.max(1);
        self
    }
}

// ---------------------------------------------------------------------------
// DraftStatus
// ---------------------------------------------------------------------------

/// The lifecycle state of a draft.
///
/// ```text
/// NotStarted → InProgress ⇄ Paused
///                   ↓
///               Completed
/// ```
///
/// `Completed` is terminal. A pick timer is armed if and only if the
/// status is `InProgress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    NotStarted,
    InProgress,
    Paused,
    Completed,
}

impl DraftStatus {
    /// Returns `true` while picks may be made.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress)
    }
}

impl std::fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Paused => write!(f, "paused"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_predicates() {
        assert!(DraftStatus::InProgress.is_active());
        assert!(!DraftStatus::Paused.is_active());
        assert!(!DraftStatus::NotStarted.is_active());
        assert!(!DraftStatus::Completed.is_active());
    }

    #[test]
    fn test_status_display_matches_wire_name() {
        for status in [
            DraftStatus::NotStarted,
            DraftStatus::InProgress,
            DraftStatus::Paused,
            DraftStatus::Completed,
        ] {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, serde_json::Value::String(status.to_string()));
        }
    }

    #[test]
    fn test_draft_config_default() {
        let config = DraftConfig::default();
        assert_eq!(config.event_capacity, 256);
        assert_eq!(config.pick_capacity, 256);
        assert_eq!(config.emit_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_draft_config_validated_clamps_zero() {
        let config = DraftConfig {
            event_capacity: 0,
            pick_capacity: 0,
            ..DraftConfig::default()
        }
        .validated();
        assert_eq!(config.event_capacity, 1);
        assert_eq!(config.pick_capacity, 1);
    }
}
