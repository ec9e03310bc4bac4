//! Wire protocol for Broadside.
//!
//! This crate defines what the server and the two players say to each
//! other:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`Coordinate`]) —
//!   the records that travel on the wire, tagged by a `type` field.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those records are
//!   converted to and from the bytes of one frame.
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer knows nothing about sockets or turns. Frame
//! delimiting belongs to the transport, ordering rules to the battle crate.
//!
//! ```text
//! Transport (frames) → Protocol (messages) → Session (players) → Battle (turns)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{BOARD_SIZE, ClientMessage, Coordinate, ServerMessage};
