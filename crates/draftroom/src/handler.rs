//! Per-connection handler.
//!
//! Each accepted connection gets its own task running [`handle_connection`]:
//!   1. Register with the hub → receive an outbound queue
//!   2. Spawn the write loop, which drains that queue onto the socket
//!   3. Run the read loop, handing every frame to the service
//!   4. On EOF, read error or timeout: unregister, stop the writer, close
//!
//! A write failure or a hub-side disconnect (slow consumer) ends the write
//! loop, which closes the socket; the read loop then sees EOF and the same
//! cleanup runs.

use std::sync::Arc;
use std::time::Duration;

use draftroom_hub::{Frame, Hub};
use draftroom_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::store::{EventStatusUpdater, PickStore};
use crate::{DraftService, DraftroomError};

/// Drop guard that removes the connection from the hub when the handler
/// exits, including on panic.
struct HubGuard {
    hub: Hub,
    conn_id: ConnectionId,
}

impl Drop for HubGuard {
    fn drop(&mut self) {
        self.hub.unregister(self.conn_id);
    }
}

/// Serves a single connection from accept to close.
pub(crate) async fn handle_connection<S, U>(
    conn: WebSocketConnection,
    service: Arc<DraftService<S, U>>,
    read_timeout: Option<Duration>,
) -> Result<(), DraftroomError>
where
    S: PickStore,
    U: EventStatusUpdater,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    let peer = conn.peer_addr();

    let outbound = service.hub().register(conn_id)?;
    let guard = HubGuard {
        hub: service.hub().clone(),
        conn_id,
    };
    tracing::info!(%conn_id, %peer, "connection opened");

    let writer = tokio::spawn(write_loop(Arc::clone(&conn), outbound));
    read_loop(&conn, &service, read_timeout).await;

    drop(guard);
    writer.abort();
    if let Err(e) = conn.close().await {
        tracing::trace!(%conn_id, error = %e, "close after read loop");
    }
    tracing::info!(%conn_id, %peer, "connection closed");
    Ok(())
}

async fn read_loop<S, U>(
    conn: &WebSocketConnection,
    service: &DraftService<S, U>,
    read_timeout: Option<Duration>,
) where
    S: PickStore,
    U: EventStatusUpdater,
{
    let conn_id = conn.id();
    loop {
        let next = match read_timeout {
            Some(limit) => match tokio::time::timeout(limit, conn.recv()).await {
                Ok(next) => next,
                Err(_) => {
                    tracing::info!(%conn_id, "connection idle too long");
                    return;
                }
            },
            None => conn.recv().await,
        };

        match next {
            Ok(Some(data)) => service.handle_inbound(conn_id, &data).await,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed by peer");
                return;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                return;
            }
        }
    }
}

async fn write_loop(conn: Arc<WebSocketConnection>, mut outbound: mpsc::Receiver<Frame>) {
    let conn_id = conn.id();
    while let Some(frame) = outbound.recv().await {
        if let Err(e) = conn.send(&frame).await {
            tracing::debug!(%conn_id, error = %e, "send error");
            break;
        }
    }
    // Queue closed by the hub, or the socket is gone. Either way the read
    // loop should stop too.
    if let Err(e) = conn.close().await {
        tracing::trace!(%conn_id, error = %e, "close after write loop");
    }
}
