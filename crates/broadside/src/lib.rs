//! # Broadside
//!
//! A server for one two-player naval battle over the network.
//!
//! Two peers connect, announce a name, and place their ships in parallel.
//! Once both placements are in, the server alternates turns: it tells each
//! player whose turn it is, accepts an attack only from the active player,
//! and reports the hit or miss to both sides. There is no win condition;
//! the session ends when a player is lost.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use broadside::prelude::*;
//!
//! # async fn example() -> Result<(), BroadsideError> {
//! let server = SessionServer::builder()
//!     .bind("0.0.0.0:12345")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```
//!
//! ## Layers
//!
//! ```text
//! broadside-transport  frames over TCP (newline-delimited) or WebSocket
//! broadside-protocol   tagged JSON messages and coordinates
//! broadside-session    players, message channels, phase and turn state
//! broadside-battle     setup coordinator and turn arbiter
//! broadside            this crate: seating, sequencing, the binary
//! ```

mod config;
mod error;
mod handshake;
mod server;

pub use config::{DEFAULT_BIND_ADDR, DEFAULT_HANDSHAKE_TIMEOUT, ServerConfig};
pub use error::BroadsideError;
pub use server::{SessionServer, SessionServerBuilder};

pub use broadside_battle as battle;
pub use broadside_protocol as protocol;
pub use broadside_session as session;
pub use broadside_transport as transport;

/// The types most servers and tests need.
pub mod prelude {
    pub use broadside_battle::{BattleError, TurnOutcome};
    pub use broadside_protocol::{ClientMessage, Coordinate, ServerMessage};
    pub use broadside_session::{Phase, SessionSnapshot, SessionState};
    pub use broadside_transport::{TcpTransport, Transport};

    pub use crate::{BroadsideError, ServerConfig, SessionServer, SessionServerBuilder};
}
