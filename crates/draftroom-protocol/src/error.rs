//! Error types for the protocol layer.
//!
//! Every `ProtocolError` is a *malformed-message* condition: it is reported
//! to the connection that sent the frame and never affects draft state.

/// Errors that can occur while encoding or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The frame is not valid JSON, has no `type`, or its fields do not
    /// match the shape of its `type`.
    #[cfg(feature = "json")]
    #[error("invalid message format: {0}")]
    Decode(serde_json::Error),

    /// The frame decoded but its `type` is not one the engine accepts.
    #[error("unknown message type: {0}")]
    UnknownType(String),

    /// The frame is larger than the engine accepts.
    #[error("message too large: {len} bytes (max {max})")]
    FrameTooLarge { len: usize, max: usize },

    /// The message is invalid for a reason other than its encoding.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
