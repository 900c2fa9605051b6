use draftroom_protocol::{EventId, PlayerId, UserId};
use serde::{Deserialize, Serialize};

/// One completed pick, manual or automatic.
///
/// Pick numbers are 1-based and contiguous within an event; `round` is the
/// 1-based round the pick was made in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickResult {
    pub event_id: EventId,
    pub user_id: UserId,
    pub player_id: PlayerId,
    pub pick_number: u32,
    pub round: u32,
    pub auto_draft: bool,
}

/// Delivered once on the completion channel when a draft finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSummary {
    pub event_id: EventId,
    pub total_picks: u32,
    pub total_rounds: u32,
}
