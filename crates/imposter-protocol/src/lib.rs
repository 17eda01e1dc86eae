//! Wire protocol for the imposter room service.
//!
//! This crate defines the "language" that clients and the Room Service
//! speak:
//!
//! - **Types** ([`PlayerId`], [`RoomCode`], [`Role`], …) shared by every layer.
//! - **Messages** ([`ClientMessage`], [`ServerMessage`], [`RoomView`],
//!   [`Envelope`]) that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) turning them into bytes.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Room Service / Client session
//! ```

mod codec;
mod error;
mod messages;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use messages::{
    ClientMessage, CreateRoom, Envelope, JoinRoom, PlayerSummary, RoomChanged, RoomRequest,
    RoomView, ServerMessage,
};
pub use types::{Locale, PackId, PlayerId, Role, RoomCode};
