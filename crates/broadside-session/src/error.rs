//! Error types for the session layer.

use std::time::Duration;

use broadside_protocol::ProtocolError;
use broadside_transport::TransportError;

use crate::Phase;

/// Errors raised while talking to one player or touching session state.
///
/// Only [`MalformedMessage`](Self::MalformedMessage) and
/// [`UnexpectedMessageKind`](Self::UnexpectedMessageKind) leave the
/// channel usable; see [`is_recoverable`](Self::is_recoverable).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The peer disconnected.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// A frame arrived but does not parse into a client message.
    #[error("malformed message: {0}")]
    MalformedMessage(#[source] ProtocolError),

    /// A well-formed message of the wrong kind for the current phase.
    #[error("unexpected message kind: expected {expected}, got {got}")]
    UnexpectedMessageKind {
        expected: &'static str,
        got: &'static str,
    },

    /// No frame arrived before the read deadline. Bytes of a partially
    /// received frame are lost, so the channel must be treated as dead.
    #[error("no message received within {0:?}")]
    TimedOut(Duration),

    /// The transport failed for a reason other than a clean close.
    #[error(transparent)]
    Transport(TransportError),

    /// A server message could not be encoded.
    #[error("encode failed: {0}")]
    Encode(#[source] ProtocolError),

    /// Ship placement is write-once.
    #[error("ships already placed for {0}")]
    ShipsAlreadyPlaced(String),

    /// Phases only move forward, one step at a time.
    #[error("invalid phase transition from {from} to {to}")]
    InvalidPhaseTransition { from: Phase, to: Phase },

    /// The operation is only valid in another phase.
    #[error("operation requires phase {expected}, session is in {actual}")]
    WrongPhase { expected: Phase, actual: Phase },
}

impl SessionError {
    /// Returns `true` if the sender should simply be polled again.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedMessage(_) | Self::UnexpectedMessageKind { .. }
        )
    }
}

/// A clean close becomes [`ConnectionClosed`](SessionError::ConnectionClosed).
/// An oversized frame becomes a malformed message: the transport has already
/// skipped past it, so the sender is simply polled again.
impl From<TransportError> for SessionError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::ConnectionClosed(_) => Self::ConnectionClosed,
            too_large @ TransportError::FrameTooLarge(_) => {
                Self::MalformedMessage(ProtocolError::InvalidMessage(too_large.to_string()))
            }
            other => Self::Transport(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        let malformed = SessionError::MalformedMessage(ProtocolError::InvalidMessage("x".into()));
        assert!(malformed.is_recoverable());

        let kind = SessionError::UnexpectedMessageKind {
            expected: "setBoats",
            got: "attack",
        };
        assert!(kind.is_recoverable());

        assert!(!SessionError::ConnectionClosed.is_recoverable());
        assert!(!SessionError::TimedOut(Duration::from_secs(1)).is_recoverable());
        let refused = std::io::Error::from(std::io::ErrorKind::InvalidData);
        assert!(!SessionError::Transport(TransportError::ReceiveFailed(refused)).is_recoverable());
    }

    #[test]
    fn test_transport_close_maps_to_connection_closed() {
        let err: SessionError = TransportError::ConnectionClosed("reset".into()).into();
        assert!(matches!(err, SessionError::ConnectionClosed));

        let failed = std::io::Error::from(std::io::ErrorKind::Other);
        let err: SessionError = TransportError::ReceiveFailed(failed).into();
        assert!(matches!(err, SessionError::Transport(TransportError::ReceiveFailed(_))));
    }

    #[test]
    fn test_oversized_frame_maps_to_recoverable_malformed() {
        let err: SessionError = TransportError::FrameTooLarge(64).into();
        assert!(matches!(err, SessionError::MalformedMessage(_)));
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("64"));
    }

    #[test]
    fn test_unexpected_kind_message() {
        let err = SessionError::UnexpectedMessageKind {
            expected: "attack",
            got: "setBoats",
        };
        assert_eq!(
            err.to_string(),
            "unexpected message kind: expected attack, got setBoats"
        );
    }
}
