//! Error types for the transport layer.

/// Errors raised by a [`Transport`](crate::Transport) or a
/// [`Connection`](crate::Connection).
///
/// Every variant is local to one connection (or to the listener); none of
/// them say anything about draft state.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listener could not be bound to the requested address.
    #[error("bind failed: {0}")]
    BindFailed(#[source] std::io::Error),

    /// Accepting a TCP stream or completing the WebSocket upgrade failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// Writing a frame to the peer failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Reading a frame from the peer failed (reset, protocol violation).
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}
