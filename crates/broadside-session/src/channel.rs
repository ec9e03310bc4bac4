//! Typed messages over one peer connection.
//!
//! This is the layer the game phases talk to. Setup and battle never see
//! raw frames; they ask a [`MessageChannel`] for the next [`ClientMessage`]
//! and hand it a [`ServerMessage`] to send.
//!
//! What a `receive` can produce:
//! - `Ok(msg)`: one complete frame that decoded cleanly.
//! - `MalformedMessage`: the frame was not valid JSON, had an unknown
//!   `type`, was missing a field, or was over the transport's frame limit.
//!   Nothing was lost on the connection, so the caller can just read again.
//! - `TimedOut`: the read timeout elapsed. The channel may have consumed
//!   part of a frame, so callers treat this as losing the peer.
//! - `ConnectionClosed` / `Transport`: the peer is gone.
//!
//! [`SessionError::is_recoverable`] draws that line for the phases, so
//! they all decide "poll again or give up" the same way.

use std::time::Duration;

use broadside_protocol::{ClientMessage, Codec, JsonCodec, ProtocolError, ServerMessage};
use broadside_transport::{Connection, ConnectionId};

use crate::SessionError;

/// Sends [`ServerMessage`]s to, and receives [`ClientMessage`]s from, a
/// single peer.
///
/// Frame boundaries come from the transport, so one `receive` always
/// yields exactly one message no matter how the peer's writes were split
/// or coalesced on the wire.
pub struct MessageChannel<C, K = JsonCodec> {
    conn: C,
    codec: K,
    read_timeout: Option<Duration>,
}

impl<C: Connection, K: Codec> MessageChannel<C, K> {
    /// Wraps a connection. Reads wait indefinitely until
    /// [`with_read_timeout`](Self::with_read_timeout) says otherwise.
    pub fn new(conn: C, codec: K) -> Self {
        Self {
            conn,
            codec,
            read_timeout: None,
        }
    }

    /// Bounds every [`receive`](Self::receive). `None` waits forever.
    pub fn with_read_timeout(mut self, read_timeout: Option<Duration>) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn id(&self) -> ConnectionId {
        self.conn.id()
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    /// Encodes `msg` and writes it as one frame.
    pub async fn send(&self, msg: &ServerMessage) -> Result<(), SessionError> {
        let bytes = self.codec.encode(msg).map_err(SessionError::Encode)?;
        self.conn.send(&bytes).await?;
        tracing::debug!(conn = %self.conn.id(), kind = msg.kind(), "sent");
        Ok(())
    }

    /// Waits for the next message using the channel's read timeout.
    pub async fn receive(&self) -> Result<ClientMessage, SessionError> {
        self.receive_within(self.read_timeout).await
    }

    /// Waits at most `deadline` (forever if `None`) for the next message.
    ///
    /// Dropping the returned future cancels the wait.
    ///
    /// # Errors
    /// - [`SessionError::ConnectionClosed`] when the peer disconnects.
    /// - [`SessionError::MalformedMessage`] when the frame does not decode
    ///   or is over the frame limit; the channel stays usable.
    /// - [`SessionError::TimedOut`] when the deadline elapses.
    pub async fn receive_within(
        &self,
        deadline: Option<Duration>,
    ) -> Result<ClientMessage, SessionError> {
        let frame = self.next_frame(deadline).await?;
        self.codec
            .decode(&frame)
            .map_err(SessionError::MalformedMessage)
    }

    /// Reads the identity announcement: one raw frame of UTF-8, trimmed.
    pub async fn receive_name(
        &self,
        deadline: Option<Duration>,
    ) -> Result<String, SessionError> {
        let frame = self.next_frame(deadline).await?;
        let text = String::from_utf8(frame).map_err(|e| {
            SessionError::MalformedMessage(ProtocolError::InvalidMessage(format!(
                "name is not UTF-8: {e}"
            )))
        })?;
        Ok(text.trim().to_owned())
    }

    /// Closes the write side so the peer sees end-of-stream.
    pub async fn close(&self) -> Result<(), SessionError> {
        self.conn.close().await.map_err(SessionError::from)
    }

    async fn next_frame(&self, deadline: Option<Duration>) -> Result<Vec<u8>, SessionError> {
        let frame = match deadline {
            Some(limit) => tokio::time::timeout(limit, self.conn.recv())
                .await
                .map_err(|_| SessionError::TimedOut(limit))??,
            None => self.conn.recv().await?,
        };
        frame.ok_or(SessionError::ConnectionClosed)
    }
}
