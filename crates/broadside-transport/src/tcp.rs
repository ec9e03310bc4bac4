//! TCP transport with newline-delimited frames.
//!
//! A raw byte stream has no message boundaries: one `read` may return half
//! a message or three of them. Every frame is therefore terminated by
//! `\n` on the wire (`\r\n` is accepted on input). JSON produced by the
//! protocol codec never contains a raw newline, so no escaping is needed.
//!
//! # Reading a frame
//!
//! [`LineConnection::recv`] reads through a `BufReader` with `take` set to
//! the frame limit plus room for `\r\n`, so a peer that never sends a
//! newline cannot make the server buffer without bound. Three outcomes:
//!
//! ```text
//! "...\n" within the limit      → one frame (trailing \r stripped)
//! whitespace-only line          → skipped, keep reading
//! limit reached, no newline     → rest of the line discarded, FrameTooLarge
//! ```
//!
//! Because the oversized line is discarded up to its terminator, the next
//! `recv` starts cleanly on the following frame and the connection stays
//! usable. The session layer treats `FrameTooLarge` like any other
//! malformed message.

use std::io::ErrorKind;
use std::net::SocketAddr;

use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt,
    BufReader, ReadHalf, WriteHalf,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Largest frame accepted by default (64 KiB). A full board of ship
/// coordinates is well under 2 KiB.
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024;

/// A TCP-based [`Transport`] that listens for incoming connections.
pub struct TcpTransport {
    listener: TcpListener,
    max_frame_len: usize,
}

impl TcpTransport {
    /// Binds a new TCP transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "TCP transport listening");
        Ok(Self {
            listener,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        })
    }

    /// Sets the largest frame accepted from peers.
    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }
}

impl Transport for TcpTransport {
    type Connection = TcpConnection;

    async fn accept(&mut self) -> Result<Self::Connection, TransportError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(%addr, error = %e, "could not set TCP_NODELAY");
        }

        let conn = LineConnection::with_max_frame_len(stream, self.max_frame_len);
        tracing::debug!(id = %conn.id(), %addr, "accepted TCP connection");
        Ok(conn)
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// A connection over a TCP socket.
pub type TcpConnection = LineConnection<TcpStream>;

/// Newline-delimited framing over any byte stream.
///
/// Generic so the same framing runs over a `TcpStream` in production and
/// over an in-process `tokio::io::duplex` pipe in tests.
pub struct LineConnection<S> {
    id: ConnectionId,
    reader: Mutex<BufReader<ReadHalf<S>>>,
    writer: Mutex<WriteHalf<S>>,
    max_frame_len: usize,
}

impl<S> LineConnection<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Wraps a stream with the default frame limit.
    pub fn new(stream: S) -> Self {
        Self::with_max_frame_len(stream, DEFAULT_MAX_FRAME_LEN)
    }

    /// Wraps a stream, rejecting frames longer than `max_frame_len`.
    pub fn with_max_frame_len(stream: S, max_frame_len: usize) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            id: ConnectionId::next(),
            reader: Mutex::new(BufReader::new(read_half)),
            writer: Mutex::new(write_half),
            max_frame_len,
        }
    }
}

impl<S> Connection for LineConnection<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    async fn send(&self, frame: &[u8]) -> Result<(), TransportError> {
        if frame.contains(&b'\n') {
            return Err(TransportError::SendFailed(std::io::Error::new(
                ErrorKind::InvalidInput,
                "frame contains a newline",
            )));
        }

        let mut line = Vec::with_capacity(frame.len() + 1);
        line.extend_from_slice(frame);
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await.map_err(write_error)?;
        writer.flush().await.map_err(write_error)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut reader = self.reader.lock().await;
        // Room for the frame plus its "\r\n" terminator.
        let limit = self.max_frame_len as u64 + 2;

        loop {
            let mut frame = Vec::new();
            let read = (&mut *reader)
                .take(limit)
                .read_until(b'\n', &mut frame)
                .await
                .map_err(read_error)?;

            if read == 0 {
                return Ok(None);
            }

            let terminated = frame.last() == Some(&b'\n');
            if !terminated && read as u64 == limit {
                skip_line(&mut *reader).await?;
                return Err(TransportError::FrameTooLarge(self.max_frame_len));
            }
            if terminated {
                frame.pop();
                if frame.last() == Some(&b'\r') {
                    frame.pop();
                }
            }
            if frame.len() > self.max_frame_len {
                return Err(TransportError::FrameTooLarge(self.max_frame_len));
            }

            // Blank lines carry nothing; keep reading.
            if frame.iter().all(u8::is_ascii_whitespace) {
                if terminated {
                    continue;
                }
                return Ok(None);
            }

            return Ok(Some(frame));
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.writer
            .lock()
            .await
            .shutdown()
            .await
            .map_err(write_error)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// Discards input up to and including the next `\n`, so the following
/// `recv` starts on a frame boundary. Stops quietly at end of stream.
async fn skip_line<R>(reader: &mut R) -> Result<(), TransportError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let buf = reader.fill_buf().await.map_err(read_error)?;
        if buf.is_empty() {
            return Ok(());
        }
        match buf.iter().position(|&b| b == b'\n') {
            Some(end) => {
                reader.consume(end + 1);
                return Ok(());
            }
            None => {
                let len = buf.len();
                reader.consume(len);
            }
        }
    }
}

fn read_error(e: std::io::Error) -> TransportError {
    match e.kind() {
        ErrorKind::ConnectionReset | ErrorKind::UnexpectedEof => {
            TransportError::ConnectionClosed(e.to_string())
        }
        _ => TransportError::ReceiveFailed(e),
    }
}

fn write_error(e: std::io::Error) -> TransportError {
    match e.kind() {
        ErrorKind::BrokenPipe | ErrorKind::ConnectionReset => {
            TransportError::ConnectionClosed(e.to_string())
        }
        _ => TransportError::SendFailed(e),
    }
}
