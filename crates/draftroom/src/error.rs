//! Unified error type for the draftroom engine.

use draftroom_hub::HubError;
use draftroom_protocol::ProtocolError;
use draftroom_state::DraftError;
use draftroom_transport::TransportError;

use crate::store::StoreError;

/// Top-level error wrapping every sub-crate error.
///
/// Only [`DraftroomError::Protocol`], [`DraftroomError::Draft`] and
/// [`DraftroomError::NoActiveRoom`] are ever reported back to a
/// participant; the rest stay in the logs.
#[derive(Debug, thiserror::Error)]
pub enum DraftroomError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An inbound frame could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The draft refused the operation.
    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error(transparent)]
    Hub(#[from] HubError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A command arrived before any room was created.
    #[error("no active draft room")]
    NoActiveRoom,
}

impl DraftroomError {
    /// Stable snake_case code for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Protocol(_) => "malformed_message",
            Self::Draft(e) => e.kind(),
            Self::Hub(_) => "hub",
            Self::Store(_) => "store",
            Self::NoActiveRoom => "no_active_room",
        }
    }
}
