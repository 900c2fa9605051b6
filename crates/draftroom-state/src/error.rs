//! Error types for the draft state machine.

use draftroom_protocol::{PlayerId, UserId};

use crate::DraftStatus;

/// Why a draft operation was refused.
///
/// All variants are recoverable and local to the participant who asked:
/// no state is mutated when an operation returns one of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    /// The operation is not valid in the current status, e.g. starting a
    /// draft twice or resuming one that is not paused.
    #[error("invalid draft state: {0}")]
    InvalidState(String),

    /// A pick was attempted while the draft is not running.
    #[error("draft is not in progress (status: {0})")]
    NotInProgress(DraftStatus),

    /// The picker is not the participant whose turn it is.
    #[error("not your turn: waiting on {expected}")]
    WrongTurn { expected: UserId, actual: UserId },

    /// The item was already taken or was never in the pool.
    #[error("player {0} is not available")]
    ItemUnavailable(PlayerId),

    /// The start configuration is malformed.
    #[error("bad draft parameters: {0}")]
    BadParameters(String),
}

impl DraftError {
    /// Stable snake_case code for logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidState(_) => "invalid_state",
            Self::NotInProgress(_) => "not_in_progress",
            Self::WrongTurn { .. } => "wrong_turn",
            Self::ItemUnavailable(_) => "item_unavailable",
            Self::BadParameters(_) => "bad_parameters",
        }
    }
}
