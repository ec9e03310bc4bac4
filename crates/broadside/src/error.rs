//! Unified error type for the Broadside server.

use broadside_battle::BattleError;
use broadside_protocol::ProtocolError;
use broadside_session::SessionError;
use broadside_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum BroadsideError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (channel, phase, placement).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The setup or battle phase ended, usually because a player left.
    #[error(transparent)]
    Battle(#[from] BattleError),
}

impl BroadsideError {
    /// Returns `true` if the session ended because a player was lost.
    pub fn is_peer_lost(&self) -> bool {
        matches!(self, Self::Battle(e) if e.lost_index().is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let broadside_err: BroadsideError = err.into();
        assert!(matches!(broadside_err, BroadsideError::Transport(_)));
        assert!(broadside_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let broadside_err: BroadsideError = err.into();
        assert!(matches!(broadside_err, BroadsideError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::ShipsAlreadyPlaced("Ana".into());
        let broadside_err: BroadsideError = err.into();
        assert!(matches!(broadside_err, BroadsideError::Session(_)));
        assert!(!broadside_err.is_peer_lost());
    }

    #[test]
    fn test_from_battle_error() {
        let err = BattleError::peer_lost(0, "Ana", SessionError::ConnectionClosed);
        let broadside_err: BroadsideError = err.into();
        assert!(broadside_err.is_peer_lost());
        assert!(broadside_err.to_string().contains("Ana"));
    }
}
