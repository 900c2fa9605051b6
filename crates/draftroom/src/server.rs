//! `DraftServer` builder and accept loop.
//!
//! This ties the layers together: transport → hub → service → room.

use std::sync::Arc;
use std::time::Duration;

use draftroom_hub::{Hub, HubConfig};
use draftroom_state::{DraftConfig, PickSelector, RandomSelector};
use draftroom_transport::{Transport, WebSocketTransport};
use serde::{Deserialize, Serialize};

use crate::handler::handle_connection;
use crate::store::{EventStatusUpdater, PickStore};
use crate::{DraftService, DraftroomError};

/// Everything needed to stand up a server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on, e.g. `"0.0.0.0:8080"`.
    pub bind_addr: String,
    pub hub: HubConfig,
    pub draft: DraftConfig,
    /// Close a connection that sends nothing for this long. `None` keeps
    /// idle connections open indefinitely.
    pub read_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            hub: HubConfig::default(),
            draft: DraftConfig::default(),
            read_timeout: None,
        }
    }
}

/// Builder for configuring and starting a draft server.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use draftroom::prelude::*;
///
/// # async fn run() -> Result<(), DraftroomError> {
/// let store = Arc::new(InMemoryStore::new());
/// let server = DraftServer::<InMemoryStore, InMemoryStore>::builder()
///     .bind("0.0.0.0:8080")
///     .build(Arc::clone(&store), store)
///     .await?;
/// server.service().create_room(EventId(1), vec![PlayerId(1), PlayerId(2)]).await;
/// server.run().await
/// # }
/// ```
pub struct DraftServerBuilder {
    config: ServerConfig,
    selector: Arc<dyn PickSelector>,
}

impl DraftServerBuilder {
    /// Creates a builder with default settings and random auto-draft.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            selector: Arc::new(RandomSelector),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    pub fn hub_config(mut self, config: HubConfig) -> Self {
        self.config.hub = config;
        self
    }

    pub fn draft_config(mut self, config: DraftConfig) -> Self {
        self.config.draft = config;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = Some(timeout);
        self
    }

    /// Sets how auto-drafts choose an item.
    pub fn selector(mut self, selector: impl PickSelector) -> Self {
        self.selector = Arc::new(selector);
        self
    }

    /// Binds the listener and assembles the service.
    pub async fn build<S, U>(
        self,
        store: Arc<S>,
        status: Arc<U>,
    ) -> Result<DraftServer<S, U>, DraftroomError>
    where
        S: PickStore,
        U: EventStatusUpdater,
    {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        let service = Arc::new(DraftService::new(
            Hub::new(self.config.hub),
            self.config.draft,
            self.selector,
            store,
            status,
        ));
        Ok(DraftServer {
            transport,
            service,
            read_timeout: self.config.read_timeout,
        })
    }
}

impl Default for DraftServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound draft server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct DraftServer<S: PickStore, U: EventStatusUpdater> {
    transport: WebSocketTransport,
    service: Arc<DraftService<S, U>>,
    read_timeout: Option<Duration>,
}

impl<S: PickStore, U: EventStatusUpdater> DraftServer<S, U> {
    pub fn builder() -> DraftServerBuilder {
        DraftServerBuilder::new()
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The shared service, for creating rooms and querying state from
    /// outside the WebSocket surface.
    pub fn service(&self) -> Arc<DraftService<S, U>> {
        Arc::clone(&self.service)
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(mut self) -> Result<(), DraftroomError> {
        tracing::info!(addr = ?self.local_addr().ok(), "draft server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let service = Arc::clone(&self.service);
                    let read_timeout = self.read_timeout;
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, service, read_timeout).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
