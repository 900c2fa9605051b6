//! # draftroom
//!
//! A live, turn-based snake draft engine. Participants connect over
//! WebSockets, take turns claiming items from a shared pool under a pick
//! timer, and every state change is broadcast to all of them.
//!
//! The crate ties the layers together:
//!
//! - [`draftroom_transport`]: WebSocket connections
//! - [`draftroom_protocol`]: the JSON wire messages
//! - [`draftroom_hub`]: per-connection outbound queues and broadcast
//! - [`draftroom_state`]: the draft state machine and pick timer
//! - [`DraftService`]: the orchestrator that owns the active room and
//!   bridges it to persistence ([`PickStore`]) and event status
//!   ([`EventStatusUpdater`])
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use draftroom::prelude::*;
//!
//! # async fn run() -> Result<(), DraftroomError> {
//! let store = Arc::new(InMemoryStore::new());
//! let server = DraftServer::<InMemoryStore, InMemoryStore>::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(Arc::clone(&store), store)
//!     .await?;
//! let pool = (1..=40).map(PlayerId).collect();
//! server.service().create_room(EventId(1), pool).await;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;
mod service;
mod store;

pub use error::DraftroomError;
pub use server::{DraftServer, DraftServerBuilder, ServerConfig};
pub use service::DraftService;
pub use store::{EventStatus, EventStatusUpdater, InMemoryStore, PickStore, StoreError, StoredPick};

pub use draftroom_state::{DraftSummary, PickResult, RoomSnapshot};

/// Everything needed to run a server or write a collaborator.
pub mod prelude {
    pub use crate::{
        DraftServer, DraftServerBuilder, DraftService, DraftroomError, EventStatus,
        EventStatusUpdater, InMemoryStore, PickStore, ServerConfig, StoreError,
    };
    pub use draftroom_hub::HubConfig;
    pub use draftroom_protocol::{ClientMessage, EventId, PlayerId, ServerMessage, UserId};
    pub use draftroom_state::{
        DraftConfig, DraftStatus, FirstAvailable, PickResult, PickSelector, RandomSelector,
        RoomSnapshot,
    };
}
