//! The two phases of a Broadside session.
//!
//! - [`SetupCoordinator`] — one task per player collects ship placements
//!   in parallel; [`SetupCoordinator::await_placements`] is the barrier
//!   between setup and battle.
//! - [`TurnArbiter`] — a single loop that notifies, reads the active
//!   player's attack, resolves it with [`resolve_attack`], and hands the
//!   turn over. It has no end state; only a lost peer stops it.

mod arbiter;
mod error;
mod setup;

pub use arbiter::{TurnArbiter, TurnOutcome, resolve_attack};
pub use error::BattleError;
pub use setup::SetupCoordinator;
