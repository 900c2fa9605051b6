//! Draft state machine for draftroom.
//!
//! One [`DraftRoom`] holds the authoritative state of one draft: the pick
//! order, the shrinking item pool, whose turn it is, and the pick timer.
//! Every operation takes the room's single lock for its full duration,
//! including emission, so the events a room produces are totally ordered.
//!
//! # Key types
//!
//! - [`DraftRoom`]: cheap-to-clone handle; start/pick/pause/resume
//! - [`DraftStreams`]: the receiving ends of the room's event, pick-record
//!   and completion queues, drained by the orchestrator
//! - [`DraftStatus`]: lifecycle state machine
//! - [`DraftConfig`]: queue capacities and emission timeout
//! - [`PickSelector`]: how the engine chooses an item on timer expiry
//! - [`snake`]: pick-order arithmetic

mod config;
mod error;
mod pick;
mod room;
mod selector;
pub mod snake;

pub use config::{DraftConfig, DraftStatus};
pub use error::DraftError;
pub use pick::{DraftSummary, PickResult};
pub use room::{DraftRoom, DraftStreams, RoomSnapshot};
pub use selector::{FirstAvailable, PickSelector, RandomSelector};
