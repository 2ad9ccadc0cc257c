//! Wire protocol for Stagecall.
//!
//! This crate defines what clients and the relay say to each other:
//!
//! - **Identity** ([`RoomCode`], [`Role`]): which room, and which side of it.
//! - **Messages** ([`ClientMessage`], [`ServerMessage`]): the closed set of
//!   things that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! It knows nothing about sockets or rooms.
//!
//! ```text
//! Transport (frames) → Protocol (messages) → Relay (rooms)
//! ```

mod code;
mod codec;
mod error;
mod types;

pub use code::{ALPHABET, CODE_LEN, RoomCode};
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientMessage, MAX_CHOICE_LEN, Presence, Role, ServerMessage};
