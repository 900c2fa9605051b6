//! Inbound and outbound message sets.
//!
//! Both enums are internally tagged by `type`, so a variant serializes as
//! `{ "type": "pick_made", "userID": 1, ... }`. Field names are pinned
//! with explicit renames because the wire spells identifiers `userID`,
//! not `userId`.

use serde::{Deserialize, Serialize};

use crate::{Codec, EventId, PlayerId, ProtocolError, UserId};

/// Largest inbound frame the engine will decode.
pub const MAX_FRAME_LEN: usize = 32 * 1024;

/// A message sent by a participant to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start the draft in the current room. The item pool comes from the
    /// room itself, not from this message.
    StartDraft {
        #[serde(rename = "pickOrder")]
        pick_order: Vec<UserId>,
        #[serde(rename = "totalRounds")]
        total_rounds: u32,
        /// Per-pick budget in whole seconds.
        #[serde(rename = "timerDuration")]
        timer_duration: u64,
    },

    MakePick {
        #[serde(rename = "userID")]
        user_id: UserId,
        #[serde(rename = "playerID")]
        player_id: PlayerId,
    },

    PauseDraft {},

    ResumeDraft {},
}

impl ClientMessage {
    /// Every `type` value this enum accepts.
    pub const TYPES: [&'static str; 4] =
        ["start_draft", "make_pick", "pause_draft", "resume_draft"];

    /// Decodes one inbound frame.
    ///
    /// Unlike a bare `codec.decode`, this separates the three ways a frame
    /// can be malformed so the sender gets a useful error: the frame is
    /// too large, it is not a tagged object, or its `type` is unknown.
    pub fn decode_frame<C: Codec>(codec: &C, data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() > MAX_FRAME_LEN {
            return Err(ProtocolError::FrameTooLarge {
                len: data.len(),
                max: MAX_FRAME_LEN,
            });
        }

        #[derive(Deserialize)]
        struct TypeProbe {
            #[serde(rename = "type")]
            kind: String,
        }

        let probe: TypeProbe = codec.decode(data)?;
        if !Self::TYPES.contains(&probe.kind.as_str()) {
            return Err(ProtocolError::UnknownType(probe.kind));
        }
        codec.decode(data)
    }

    /// The wire `type` of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StartDraft { .. } => "start_draft",
            Self::MakePick { .. } => "make_pick",
            Self::PauseDraft {} => "pause_draft",
            Self::ResumeDraft {} => "resume_draft",
        }
    }
}

/// A message sent by the engine.
///
/// Every variant except [`ServerMessage::Error`] is broadcast to all
/// connections; `Error` goes only to the connection whose message failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    DraftStarted {
        #[serde(rename = "eventID")]
        event_id: EventId,
        #[serde(rename = "currentTurn")]
        current_turn: UserId,
        #[serde(rename = "roundNumber")]
        round_number: u32,
        /// Unix seconds.
        #[serde(rename = "turnDeadline")]
        turn_deadline: i64,
    },

    TurnChanged {
        #[serde(rename = "currentTurn")]
        current_turn: UserId,
        #[serde(rename = "roundNumber")]
        round_number: u32,
        #[serde(rename = "turnDeadline")]
        turn_deadline: i64,
    },

    PickMade {
        #[serde(rename = "userID")]
        user_id: UserId,
        #[serde(rename = "playerID")]
        player_id: PlayerId,
        /// 1-indexed position of this pick in the whole draft.
        #[serde(rename = "pickNumber")]
        pick_number: u32,
        round: u32,
        #[serde(rename = "autoDraft")]
        auto_draft: bool,
    },

    DraftPaused {
        #[serde(rename = "eventID")]
        event_id: EventId,
        /// Whole seconds left on the paused pick, rounded up.
        #[serde(rename = "remainingTime")]
        remaining_time: u64,
    },

    DraftResumed {
        #[serde(rename = "eventID")]
        event_id: EventId,
        #[serde(rename = "currentTurn")]
        current_turn: UserId,
        #[serde(rename = "turnDeadline")]
        turn_deadline: i64,
    },

    DraftCompleted {
        #[serde(rename = "eventID")]
        event_id: EventId,
        #[serde(rename = "totalPicks")]
        total_picks: u32,
        #[serde(rename = "totalRounds")]
        total_rounds: u32,
    },

    Error { error: String },
}

impl ServerMessage {
    /// Builds the participant-local error reply.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    /// The wire `type` of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DraftStarted { .. } => "draft_started",
            Self::TurnChanged { .. } => "turn_changed",
            Self::PickMade { .. } => "pick_made",
            Self::DraftPaused { .. } => "draft_paused",
            Self::DraftResumed { .. } => "draft_resumed",
            Self::DraftCompleted { .. } => "draft_completed",
            Self::Error { .. } => "error",
        }
    }
}
