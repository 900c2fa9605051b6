//! The hub: a registry of live connections and their outbound queues.
//!
//! # Concurrency note
//!
//! The registry sits behind a `parking_lot::RwLock` that is never held
//! across an `.await`. Broadcast takes the read lock and uses `try_send`,
//! so it never waits on a consumer. Connections that could not accept a
//! frame are removed afterwards under a short write lock; dropping their
//! sender closes the queue, which ends that connection's write loop.

use std::collections::HashMap;
use std::sync::Arc;

use draftroom_transport::ConnectionId;
use parking_lot::RwLock;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::{HubConfig, HubError};

/// One encoded outbound frame. Shared, so fan-out clones a pointer rather
/// than the bytes.
pub type Frame = Arc<[u8]>;

/// Outcome of a single [`Hub::broadcast`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections whose queue accepted the frame.
    pub delivered: usize,
    /// Connections removed because their queue was full or closed.
    pub dropped: usize,
}

/// Registry of live connections. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Hub {
    connections: Arc<RwLock<HashMap<ConnectionId, mpsc::Sender<Frame>>>>,
    config: HubConfig,
}

impl Hub {
    /// Creates an empty hub.
    pub fn new(config: HubConfig) -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            config: config.validated(),
        }
    }

    /// Adds a connection and returns the queue its write loop drains.
    ///
    /// # Errors
    /// [`HubError::AlreadyRegistered`] if `id` is already present.
    pub fn register(&self, id: ConnectionId) -> Result<mpsc::Receiver<Frame>, HubError> {
        let mut connections = self.connections.write();
        if connections.contains_key(&id) {
            return Err(HubError::AlreadyRegistered(id));
        }
        let (tx, rx) = mpsc::channel(self.config.outbound_capacity);
        connections.insert(id, tx);
        tracing::debug!(conn_id = %id, live = connections.len(), "connection registered");
        Ok(rx)
    }

    /// Removes a connection. Returns `false` if it was not registered
    /// (for example because broadcast already dropped it).
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let mut connections = self.connections.write();
        let removed = connections.remove(&id).is_some();
        if removed {
            tracing::debug!(conn_id = %id, live = connections.len(), "connection unregistered");
        }
        removed
    }

    /// Delivers `frame` to every registered connection.
    ///
    /// Per-connection order matches call order. A connection whose queue
    /// is full or closed is unregistered; the others are unaffected.
    pub fn broadcast(&self, frame: impl Into<Frame>) -> BroadcastReport {
        let frame = frame.into();
        let mut report = BroadcastReport::default();
        let mut failed = Vec::new();

        {
            let connections = self.connections.read();
            for (id, tx) in connections.iter() {
                match tx.try_send(Arc::clone(&frame)) {
                    Ok(()) => report.delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(conn_id = %id, "outbound queue full, dropping slow connection");
                        failed.push(*id);
                    }
                    Err(TrySendError::Closed(_)) => {
                        tracing::debug!(conn_id = %id, "outbound queue closed, removing connection");
                        failed.push(*id);
                    }
                }
            }
        }

        if !failed.is_empty() {
            let mut connections = self.connections.write();
            for id in &failed {
                connections.remove(id);
            }
            report.dropped = failed.len();
        }

        report
    }

    /// Delivers `frame` to one connection only.
    ///
    /// # Errors
    /// - [`HubError::NotRegistered`] if `id` is unknown or its queue is closed
    /// - [`HubError::QueueFull`] if its queue is full; the connection is
    ///   dropped, exactly as broadcast would do
    pub fn send_to(&self, id: ConnectionId, frame: impl Into<Frame>) -> Result<(), HubError> {
        let result = {
            let connections = self.connections.read();
            let tx = connections.get(&id).ok_or(HubError::NotRegistered(id))?;
            tx.try_send(frame.into())
        };

        match result {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %id, "outbound queue full, dropping slow connection");
                self.connections.write().remove(&id);
                Err(HubError::QueueFull(id))
            }
            Err(TrySendError::Closed(_)) => {
                self.connections.write().remove(&id);
                Err(HubError::NotRegistered(id))
            }
        }
    }

    /// Returns `true` if `id` is currently registered.
    pub fn is_registered(&self, id: ConnectionId) -> bool {
        self.connections.read().contains_key(&id)
    }

    /// Number of registered connections.
    pub fn connection_count(&self) -> usize {
        self.connections.read().len()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}
