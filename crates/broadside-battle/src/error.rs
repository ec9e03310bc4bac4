//! Error types for the battle layer.

use broadside_session::SessionError;

/// Errors that end a setup or battle phase.
#[derive(Debug, thiserror::Error)]
pub enum BattleError {
    /// A player's connection became unusable: closed, timed out, or a
    /// send failed.
    #[error("player {index} ({name}) lost: {source}")]
    PeerLost {
        index: usize,
        name: String,
        #[source]
        source: SessionError,
    },

    /// The battle cannot start for a player without a placement.
    #[error("player {0} has not placed ships")]
    ShipsNotPlaced(usize),

    /// A setup task panicked or was cancelled.
    #[error("setup task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),

    /// Session state rejected an operation.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl BattleError {
    /// Builds a [`PeerLost`](Self::PeerLost) for the player at `index`.
    pub fn peer_lost(index: usize, name: &str, source: SessionError) -> Self {
        Self::PeerLost {
            index,
            name: name.to_owned(),
            source,
        }
    }

    /// Seat of the lost player, if this error is a lost peer.
    pub fn lost_index(&self) -> Option<usize> {
        match self {
            Self::PeerLost { index, .. } => Some(*index),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_lost_display_and_index() {
        let err = BattleError::peer_lost(1, "Beto", SessionError::ConnectionClosed);
        assert_eq!(err.lost_index(), Some(1));
        assert_eq!(
            err.to_string(),
            "player 1 (Beto) lost: connection closed by peer"
        );
    }

    #[test]
    fn test_other_errors_have_no_lost_index() {
        assert_eq!(BattleError::ShipsNotPlaced(0).lost_index(), None);
    }
}
