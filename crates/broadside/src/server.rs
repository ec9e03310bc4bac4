//! `SessionServer` builder and session driver.
//!
//! A server hosts exactly one session: it seats two players, runs the setup
//! phase, then the battle phase, and returns when a player is lost.

use std::net::SocketAddr;
use std::sync::Arc;

use broadside_battle::{BattleError, SetupCoordinator, TurnArbiter};
use broadside_protocol::{JsonCodec, ServerMessage};
use broadside_session::{MessageChannel, Phase, Player, SessionState};
use broadside_transport::{Connection, TcpTransport, Transport};

use crate::config::{DEFAULT_BIND_ADDR, ServerConfig};
use crate::handshake::handshake;
use crate::BroadsideError;

type Channel<T> = MessageChannel<<T as Transport>::Connection>;

/// Builder for a TCP [`SessionServer`].
///
/// # Example
///
/// ```rust,no_run
/// # async fn example() -> Result<(), broadside::BroadsideError> {
/// use broadside::prelude::*;
///
/// let server = SessionServer::builder()
///     .bind("127.0.0.1:12345")
///     .config(ServerConfig::default())
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct SessionServerBuilder {
    bind_addr: String,
    config: ServerConfig,
}

impl SessionServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            config: ServerConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds a TCP listener and returns the server, not yet running.
    pub async fn build(self) -> Result<SessionServer<TcpTransport>, BroadsideError> {
        let transport = TcpTransport::bind(&self.bind_addr)
            .await?
            .with_max_frame_len(self.config.max_frame_len);
        Ok(SessionServer::with_transport(transport, self.config))
    }
}

impl Default for SessionServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A two-player session bound to a transport.
///
/// Call [`run()`](Self::run) to seat the players and play.
pub struct SessionServer<T: Transport> {
    transport: T,
    config: ServerConfig,
    session: Arc<SessionState>,
}

impl SessionServer<TcpTransport> {
    /// Creates a new builder.
    pub fn builder() -> SessionServerBuilder {
        SessionServerBuilder::new()
    }
}

impl<T: Transport> SessionServer<T> {
    /// Wraps an already bound transport.
    pub fn with_transport(transport: T, config: ServerConfig) -> Self {
        Self {
            transport,
            config,
            session: Arc::new(SessionState::new()),
        }
    }

    /// Shared phase and turn state, for observing a running session.
    pub fn session(&self) -> Arc<SessionState> {
        Arc::clone(&self.session)
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Runs the session to completion.
    ///
    /// The lifecycle, with the phase recorded in [`session()`](Self::session):
    ///
    /// ```text
    /// Waiting  accept + handshake until two players are seated,
    ///          then the listener is closed
    /// Setup    both players place ships in parallel
    /// Battle   startBattle to both, then turns until a player is lost
    /// ```
    ///
    /// The battle has no end state, so this only returns when a player is
    /// lost: the survivor is sent `gameOver`, both connections are closed,
    /// and the error is returned.
    pub async fn run(self) -> Result<(), BroadsideError> {
        let Self {
            mut transport,
            config,
            session,
        } = self;
        tracing::info!(addr = ?transport.local_addr().ok(), "waiting for two players");

        let first = seat_player(&mut transport, &config, 0).await;
        let second = seat_player(&mut transport, &config, 1).await;
        // Later connections are refused once the listener is gone.
        drop(transport);

        let channels = [Arc::clone(first.channel()), Arc::clone(second.channel())];
        let result = play(&session, [first, second]).await;
        if let Err(e) = &result {
            end_session(&channels, e).await;
        }
        result.map_err(BroadsideError::from)
    }
}

/// Accepts connections until one completes the handshake.
async fn seat_player<T: Transport>(
    transport: &mut T,
    config: &ServerConfig,
    index: usize,
) -> Player<T::Connection> {
    loop {
        let conn = match transport.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!(error = %e, "accept failed");
                continue;
            }
        };

        let channel: Channel<T> =
            MessageChannel::new(conn, JsonCodec).with_read_timeout(config.read_timeout);
        match handshake(&channel, index, config.handshake_timeout).await {
            Ok(name) => return Player::new(index, name, Arc::new(channel)),
            Err(e) => {
                tracing::info!(conn = %channel.id(), error = %e, "dropping connection before handshake");
                if let Err(e) = channel.close().await {
                    tracing::debug!(error = %e, "close failed");
                }
            }
        }
    }
}

async fn play<C: Connection>(
    session: &Arc<SessionState>,
    players: [Player<C>; 2],
) -> Result<(), BattleError> {
    session.advance_phase(Phase::Setup).await?;
    let players = SetupCoordinator::start(players).await_placements().await?;

    session.advance_phase(Phase::Battle).await?;
    let start = ServerMessage::start_battle();
    for player in &players {
        player
            .channel()
            .send(&start)
            .await
            .map_err(|e| BattleError::peer_lost(player.index(), player.name(), e))?;
    }

    let mut arbiter = TurnArbiter::new(players, Arc::clone(session))?;
    arbiter.run().await
}

/// Tells every remaining player the game is over, then closes all
/// connections.
async fn end_session<C: Connection>(channels: &[Arc<MessageChannel<C>>; 2], err: &BattleError) {
    let lost = err.lost_index();
    tracing::info!(error = %err, "session ended");

    for (index, channel) in channels.iter().enumerate() {
        if Some(index) != lost {
            let notice = ServerMessage::game_over(game_over_reason(err));
            if let Err(e) = channel.send(&notice).await {
                tracing::debug!(index, error = %e, "could not deliver gameOver");
            }
        }
        if let Err(e) = channel.close().await {
            tracing::debug!(index, error = %e, "close failed");
        }
    }
}

fn game_over_reason(err: &BattleError) -> String {
    match err {
        BattleError::PeerLost { name, .. } => {
            format!("Your opponent {name} has left the game. Game over.")
        }
        _ => "The session ended unexpectedly. Game over.".to_string(),
    }
}
