//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! WebSocket already delimits messages, so each data message is one frame.
//!
//! # Accepting
//!
//! A WebSocket connection is only usable after the HTTP upgrade, and the
//! upgrade needs the client to speak first. A raw TCP client that connects
//! and says nothing would otherwise park [`WebSocketTransport::accept`]
//! forever, so the upgrade runs under
//! [`handshake_timeout`](WebSocketTransport::with_handshake_timeout).
//! Sockets that fail or miss the deadline are logged and dropped, and
//! `accept` moves on to the next one.
//!
//! # Message size
//!
//! `max_frame_len` is handed to tungstenite as both the message and the
//! frame size limit, so an oversized message is refused while its header is
//! read instead of after it has been buffered. Unlike the TCP framing, a
//! WebSocket stream cannot skip the remainder of a refused message, so the
//! error is reported as a failed receive and the connection is lost.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use crate::{Connection, ConnectionId, DEFAULT_MAX_FRAME_LEN, Transport, TransportError};

type WsStream = tokio_tungstenite::WebSocketStream<TcpStream>;

/// Upgrade deadline used until [`WebSocketTransport::with_handshake_timeout`]
/// says otherwise.
const DEFAULT_UPGRADE_TIMEOUT: Duration = Duration::from_secs(10);

/// A WebSocket-based [`Transport`] that listens for incoming connections.
pub struct WebSocketTransport {
    listener: TcpListener,
    max_frame_len: usize,
    handshake_timeout: Option<Duration>,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self {
            listener,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            handshake_timeout: Some(DEFAULT_UPGRADE_TIMEOUT),
        })
    }

    /// Sets the largest message accepted from peers.
    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    /// Bounds the HTTP upgrade of each accepted socket. `None` waits
    /// forever.
    pub fn with_handshake_timeout(mut self, handshake_timeout: Option<Duration>) -> Self {
        self.handshake_timeout = handshake_timeout;
        self
    }

    fn ws_config(&self) -> WebSocketConfig {
        WebSocketConfig::default()
            .max_message_size(Some(self.max_frame_len))
            .max_frame_size(Some(self.max_frame_len))
    }

    async fn upgrade(&self, stream: TcpStream) -> Result<WsStream, TransportError> {
        let upgrade = tokio_tungstenite::accept_async_with_config(stream, Some(self.ws_config()));
        let result = match self.handshake_timeout {
            Some(limit) => tokio::time::timeout(limit, upgrade).await.map_err(|_| {
                TransportError::AcceptFailed(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("WebSocket upgrade not completed within {limit:?}"),
                ))
            })?,
            None => upgrade.await,
        };
        result.map_err(|e| {
            TransportError::AcceptFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                e,
            ))
        })
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;

    async fn accept(&mut self) -> Result<Self::Connection, TransportError> {
        loop {
            let (stream, addr) = self
                .listener
                .accept()
                .await
                .map_err(TransportError::AcceptFailed)?;

            let ws = match self.upgrade(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    tracing::info!(%addr, error = %e, "dropping socket that did not upgrade");
                    continue;
                }
            };

            let id = ConnectionId::next();
            tracing::debug!(%id, %addr, "accepted WebSocket connection");

            let (sink, stream) = ws.split();
            return Ok(WebSocketConnection {
                id,
                sink: Mutex::new(sink),
                stream: Mutex::new(stream),
            });
        }
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// A single WebSocket connection.
///
/// The sink and stream halves are locked separately so a pending receive
/// never blocks a send on the same connection.
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl Connection for WebSocketConnection {
    async fn send(&self, frame: &[u8]) -> Result<(), TransportError> {
        // Text frames for valid UTF-8 so browser clients can read them
        // without a Blob round-trip.
        let msg = match std::str::from_utf8(frame) {
            Ok(text) => Message::Text(text.to_owned().into()),
            Err(_) => Message::Binary(frame.to_vec().into()),
        };
        self.sink.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut stream = self.stream.lock().await;
        loop {
            return match stream.next().await {
                Some(Ok(Message::Binary(data))) => Ok(Some(data.into())),
                Some(Ok(Message::Text(text))) => Ok(Some(text.as_bytes().to_vec())),
                Some(Ok(Message::Close(_))) | None => Ok(None),
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(WsError::Capacity(e))) => Err(TransportError::ReceiveFailed(
                    std::io::Error::new(std::io::ErrorKind::InvalidData, e),
                )),
                Some(Err(e)) => Err(TransportError::ReceiveFailed(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    e,
                ))),
            };
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.sink.lock().await.close().await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
