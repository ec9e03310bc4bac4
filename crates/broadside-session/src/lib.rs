//! Per-player state for Broadside.
//!
//! - [`MessageChannel`] — typed, framed messages over one peer connection,
//!   with a cancellable, optionally bounded receive.
//! - [`Player`] — a peer's name, ship placement, and the hits it took.
//! - [`SessionState`] — the phase and turn index shared by every task,
//!   behind a single mutex.
//!
//! # How it fits in the stack
//!
//! ```text
//! Battle layer (above)   ← setup coordinator and turn arbiter drive Players
//!     ↕
//! Session layer (this crate)
//!     ↕
//! Protocol + Transport (below)  ← messages, codecs, frames
//! ```

mod channel;
mod error;
mod player;
mod session;

pub use channel::MessageChannel;
pub use error::SessionError;
pub use player::Player;
pub use session::{Phase, SessionSnapshot, SessionState};
