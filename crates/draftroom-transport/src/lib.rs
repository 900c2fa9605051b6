//! Transport layer for draftroom.
//!
//! Provides the [`Transport`] and [`Connection`] traits that the connection
//! handler is written against, plus a WebSocket implementation.
//!
//! A [`Connection`] is used by two tasks at once: the inbound read loop
//! calls [`Connection::recv`] while the outbound write loop calls
//! [`Connection::send`]. Implementations must therefore keep the read and
//! write halves independently lockable so one never waits on the other.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Server-assigned handle for one participant socket.
///
/// Ids are allocated from a process-wide counter and never reused, so the
/// hub can key its registry on them without worrying about a reconnect
/// inheriting a stale queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A listener that yields participant connections.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Resolves once a peer has connected and completed any upgrade
    /// handshake.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A framed, bidirectional channel to one participant.
///
/// Frames are opaque bytes here; the protocol crate gives them meaning.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Writes one frame.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Reads the next data frame, skipping control frames.
    ///
    /// `Ok(None)` means the peer closed the connection.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Starts a graceful close. Closing an already-closed connection
    /// returns an error rather than panicking.
    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId::new(7).to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_orders_by_value() {
        let mut ids = vec![ConnectionId::new(3), ConnectionId::new(1), ConnectionId::new(2)];
        ids.sort();
        assert_eq!(
            ids.into_iter().map(ConnectionId::into_inner).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }
}
