//! Setup phase: both players place ships concurrently.
//!
//! Neither player waits for the other. Each gets its own task that reads
//! its channel until a `setBoats` arrives and records the placement. No
//! reply is sent; the players hear nothing until `startBattle`. The
//! coordinator returns once both tasks are done:
//!
//! ```text
//! seat 0 task ──setBoats──→ ships recorded ─┐
//!                                          ├─→ both players handed back
//! seat 1 task ──setBoats──→ ships recorded ─┘
//! ```
//!
//! An `attack` sent during setup is logged and dropped, and so is any
//! frame that does not decode. A closed connection or a read timeout ends
//! setup for both: the failing task's error is returned and the other task
//! is aborted.

use std::sync::Arc;

use broadside_protocol::{ClientMessage, Codec, JsonCodec};
use broadside_session::{Player, SessionError};
use broadside_transport::Connection;
use tokio::task::JoinHandle;

use crate::BattleError;

type SetupResult<C, K> = Result<Player<C, K>, BattleError>;

/// Aborts the wrapped task when dropped.
///
/// If one player is lost, `await_placements` returns early and the other
/// player's task must not keep reading its socket.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Runs one placement task per player and waits for both.
///
/// Each task owns its `Player` while it runs, so a player's `ships` is
/// only ever written by its own task. Both are handed back, in seat
/// order, by [`await_placements`](Self::await_placements).
pub struct SetupCoordinator<C, K = JsonCodec> {
    tasks: [AbortOnDrop<SetupResult<C, K>>; 2],
}

impl<C, K> SetupCoordinator<C, K>
where
    C: Connection,
    K: Codec,
{
    /// Spawns a placement task for each player. Must be called from
    /// within a Tokio runtime.
    pub fn start(players: [Player<C, K>; 2]) -> Self {
        let tasks = players.map(|player| AbortOnDrop(tokio::spawn(collect_placement(player))));
        Self { tasks }
    }

    /// Returns `true` once both tasks have finished.
    pub fn is_complete(&self) -> bool {
        self.tasks.iter().all(|task| task.0.is_finished())
    }

    /// Blocks until both players have placed their ships, in whatever
    /// order they do so.
    ///
    /// # Errors
    /// Returns [`BattleError::PeerLost`] as soon as either player's
    /// connection fails; the other task is aborted.
    pub async fn await_placements(self) -> Result<[Player<C, K>; 2], BattleError> {
        let [mut first, mut second] = self.tasks;
        let (first, second) = tokio::try_join!(join(&mut first), join(&mut second))?;
        tracing::info!(
            first = %first.name(),
            second = %second.name(),
            "both players placed their ships"
        );
        Ok([first, second])
    }
}

async fn join<C, K>(task: &mut AbortOnDrop<SetupResult<C, K>>) -> SetupResult<C, K> {
    (&mut task.0).await?
}

/// Reads from one player until it sends `setBoats`.
///
/// Anything else is logged and dropped; it is not replayed in battle.
async fn collect_placement<C, K>(mut player: Player<C, K>) -> SetupResult<C, K>
where
    C: Connection,
    K: Codec,
{
    let channel = Arc::clone(player.channel());

    loop {
        match channel.receive().await {
            Ok(ClientMessage::SetBoats { coords }) => {
                tracing::info!(
                    player = %player.name(),
                    ships = coords.len(),
                    "ships placed"
                );
                tracing::debug!(player = %player.name(), ?coords, "placement");
                player.place_ships(coords)?;
                return Ok(player);
            }
            Ok(other) => {
                let err = SessionError::UnexpectedMessageKind {
                    expected: "setBoats",
                    got: other.kind(),
                };
                tracing::warn!(player = %player.name(), error = %err, "ignoring message during setup");
            }
            Err(e) if e.is_recoverable() => {
                tracing::warn!(player = %player.name(), error = %e, "ignoring message during setup");
            }
            Err(e) => {
                tracing::info!(player = %player.name(), error = %e, "player lost during setup");
                return Err(BattleError::peer_lost(player.index(), player.name(), e));
            }
        }
    }
}
