//! Broadcast hub for draftroom.
//!
//! Tracks the set of live connections and delivers encoded frames to
//! their outbound queues:
//!
//! 1. **Registration**: a connection handler calls [`Hub::register`] and
//!    gets the receiving end of a bounded queue for its write loop.
//! 2. **Fan-out**: [`Hub::broadcast`] pushes one frame onto every queue
//!    without awaiting, so a slow peer can never stall the others.
//! 3. **Direct replies**: [`Hub::send_to`] delivers to one connection
//!    (used for participant-local errors).
//!
//! # How it fits in the stack
//!
//! ```text
//! Draft service (above)  ← broadcasts state-machine events
//!     ↕
//! Hub (this crate)       ← per-connection bounded queues
//!     ↕
//! Connection write loops ← drain their queue onto the socket
//! ```

mod config;
mod error;
mod hub;

pub use config::HubConfig;
pub use error::HubError;
pub use hub::{BroadcastReport, Frame, Hub};
