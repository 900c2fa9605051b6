//! Error types for the hub.

use draftroom_transport::ConnectionId;

/// Errors returned by [`Hub`](crate::Hub) operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HubError {
    /// The connection id is already registered.
    #[error("connection {0} is already registered")]
    AlreadyRegistered(ConnectionId),

    /// No connection with this id is registered (never was, or has been
    /// unregistered or dropped as a slow consumer).
    #[error("connection {0} is not registered")]
    NotRegistered(ConnectionId),

    /// The connection's queue was full; it has been disconnected.
    #[error("outbound queue for {0} is full, connection dropped")]
    QueueFull(ConnectionId),
}
