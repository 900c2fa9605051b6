//! Wire protocol for the draftroom engine.
//!
//! This crate defines what participants and the engine say to each other:
//!
//! - **Identifiers** ([`EventId`], [`UserId`], [`PlayerId`]): newtypes
//!   so a user can never be passed where a draftable player is expected.
//! - **Messages** ([`ClientMessage`], [`ServerMessage`]): closed sets of
//!   tagged variants, one per message `type` on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how messages become bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong while decoding.
//!
//! The protocol layer knows nothing about connections or draft rules.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Draft service
//! ```

mod codec;
mod error;
mod ids;
mod messages;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use ids::{EventId, PlayerId, UserId};
pub use messages::{ClientMessage, MAX_FRAME_LEN, ServerMessage};
