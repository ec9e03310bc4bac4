//! Session-wide state: the current phase and whose turn it is.
//!
//! This is the only mutable state that crosses task boundaries. It lives
//! behind one mutex and is reachable only through the methods below, so
//! every read or update of `(phase, turn_index)` is atomic.

use std::fmt;

use tokio::sync::Mutex;

use crate::SessionError;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a session.
///
/// Transitions are strictly ordered, no skipping:
///
/// ```text
/// Waiting → Setup → Battle
/// ```
///
/// - **Waiting**: fewer than two players have connected.
/// - **Setup**: both players are connected and placing ships.
/// - **Battle**: both placements are in; players alternate attacks.
///   There is no phase after Battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Waiting,
    Setup,
    Battle,
}

impl Phase {
    /// Returns the phase that follows this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Waiting => Some(Self::Setup),
            Self::Setup => Some(Self::Battle),
            Self::Battle => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Setup => write!(f, "Setup"),
            Self::Battle => write!(f, "Battle"),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// A consistent copy of the session state taken under the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: Phase,
    /// Index (0 or 1) of the player whose attack is accepted next.
    pub turn_index: usize,
    /// Attacks resolved since the battle started.
    pub turns_resolved: u64,
}

#[derive(Debug, Default)]
struct Inner {
    phase: Phase,
    turn_index: usize,
    turns_resolved: u64,
}

/// Shared phase and turn state, guarded by a single mutex.
///
/// Shared as `Arc<SessionState>` between the server, the turn arbiter,
/// and anything observing the session.
#[derive(Debug, Default)]
pub struct SessionState {
    inner: Mutex<Inner>,
}

impl SessionState {
    /// Creates a session in the `Waiting` phase with player 0 to move first.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn phase(&self) -> Phase {
        self.inner.lock().await.phase
    }

    /// Moves to the next phase.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidPhaseTransition`] unless `to` is the
    /// immediate successor of the current phase.
    pub async fn advance_phase(&self, to: Phase) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;
        if !inner.phase.can_transition_to(to) {
            return Err(SessionError::InvalidPhaseTransition {
                from: inner.phase,
                to,
            });
        }
        tracing::info!(from = %inner.phase, to = %to, "session phase changed");
        inner.phase = to;
        Ok(())
    }

    /// Index of the active player.
    pub async fn active(&self) -> usize {
        self.inner.lock().await.turn_index
    }

    /// Hands the turn to the other player and returns the new active index.
    ///
    /// # Errors
    /// Returns [`SessionError::WrongPhase`] outside the Battle phase.
    pub async fn advance_turn(&self) -> Result<usize, SessionError> {
        let mut inner = self.inner.lock().await;
        if inner.phase != Phase::Battle {
            return Err(SessionError::WrongPhase {
                expected: Phase::Battle,
                actual: inner.phase,
            });
        }
        inner.turn_index = 1 - inner.turn_index;
        inner.turns_resolved += 1;
        Ok(inner.turn_index)
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.lock().await;
        SessionSnapshot {
            phase: inner.phase,
            turn_index: inner.turn_index,
            turns_resolved: inner.turns_resolved,
        }
    }
}
